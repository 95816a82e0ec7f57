// Copyright 2023 Greptime Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};

use lazy_static::lazy_static;

/// The type of value a PromQL expression or function argument evaluates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Vector,
    Scalar,
    Matrix,
    String,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ValueType::Scalar => write!(f, "scalar"),
            ValueType::String => write!(f, "string"),
            ValueType::Vector => write!(f, "instant vector"),
            ValueType::Matrix => write!(f, "range vector"),
        }
    }
}

/// Functions is a list of all functions supported by PromQL, including their
/// types. The return type decides whether a function identifier lexes as a
/// scalar- or vector-valued function.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: &'static str,
    pub arg_types: Vec<ValueType>,
    pub variadic: bool,
    pub return_type: ValueType,
}

impl Function {
    pub fn new(
        name: &'static str,
        arg_types: Vec<ValueType>,
        variadic: bool,
        return_type: ValueType,
    ) -> Self {
        Self {
            name,
            arg_types,
            variadic,
            return_type,
        }
    }

    /// human-readable signature used as suggestion detail,
    /// e.g. `rate(range vector) -> instant vector`.
    pub fn signature(&self) -> String {
        let args = self
            .arg_types
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let variadic = if self.variadic { ", ..." } else { "" };
        format!("{}({}{}) -> {}", self.name, args, variadic, self.return_type)
    }
}

macro_rules! map {
    ($(($name:literal, $arg:expr, $ret:expr)),*) => (
        {
            let mut m: HashMap<&'static str, Function> = HashMap::new();
            $(
                let variadic = FUNCTIONS_WITH_VARIADIC_ARGS.contains($name);
                let func = Function::new($name, $arg, variadic, $ret);
                m.insert($name, func);
            )*
            m
        }
    );
}

lazy_static! {
    static ref FUNCTIONS_WITH_VARIADIC_ARGS: HashSet<&'static str> = HashSet::from([
        "days_in_month",
        "day_of_year",
        "day_of_month",
        "day_of_week",

        "year",
        "month",
        "hour",
        "minute",

        "label_join",
        "round",
    ]);

    static ref FUNCTIONS: HashMap<&'static str, Function> = map!(
        ("abs", vec![ValueType::Vector], ValueType::Vector),
        ("absent", vec![ValueType::Vector], ValueType::Vector),
        ("absent_over_time", vec![ValueType::Matrix], ValueType::Vector),
        ("avg_over_time", vec![ValueType::Matrix], ValueType::Vector),
        ("ceil", vec![ValueType::Vector], ValueType::Vector),
        ("changes", vec![ValueType::Matrix], ValueType::Vector),
        ("clamp", vec![ValueType::Vector, ValueType::Scalar, ValueType::Scalar], ValueType::Vector),
        ("clamp_max", vec![ValueType::Vector, ValueType::Scalar], ValueType::Vector),
        ("clamp_min", vec![ValueType::Vector, ValueType::Scalar], ValueType::Vector),
        ("count_over_time", vec![ValueType::Matrix], ValueType::Vector),
        ("days_in_month", vec![ValueType::Vector], ValueType::Vector),
        ("day_of_month", vec![ValueType::Vector], ValueType::Vector),
        ("day_of_week", vec![ValueType::Vector], ValueType::Vector),
        ("day_of_year", vec![ValueType::Vector], ValueType::Vector),
        ("delta", vec![ValueType::Matrix], ValueType::Vector),
        ("deriv", vec![ValueType::Matrix], ValueType::Vector),
        ("exp", vec![ValueType::Vector], ValueType::Vector),
        ("floor", vec![ValueType::Vector], ValueType::Vector),
        ("histogram_quantile", vec![ValueType::Scalar, ValueType::Vector], ValueType::Vector),
        ("holt_winters", vec![ValueType::Matrix, ValueType::Scalar, ValueType::Scalar], ValueType::Vector),
        ("hour", vec![ValueType::Vector], ValueType::Vector),
        ("idelta", vec![ValueType::Matrix], ValueType::Vector),
        ("increase", vec![ValueType::Matrix], ValueType::Vector),
        ("irate", vec![ValueType::Matrix], ValueType::Vector),
        (
            "label_replace",
            vec![ValueType::Vector, ValueType::String, ValueType::String, ValueType::String, ValueType::String,],
            ValueType::Vector
        ),
        (
            "label_join",
            vec![ValueType::Vector, ValueType::String, ValueType::String, ValueType::String,],
            ValueType::Vector
        ),
        ("last_over_time", vec![ValueType::Matrix], ValueType::Vector),
        ("ln", vec![ValueType::Vector], ValueType::Vector),
        ("log10", vec![ValueType::Vector], ValueType::Vector),
        ("log2", vec![ValueType::Vector], ValueType::Vector),
        ("max_over_time", vec![ValueType::Matrix], ValueType::Vector),
        ("min_over_time", vec![ValueType::Matrix], ValueType::Vector),
        ("minute", vec![ValueType::Vector], ValueType::Vector),
        ("month", vec![ValueType::Vector], ValueType::Vector),
        ("pi", vec![], ValueType::Scalar),
        ("predict_linear", vec![ValueType::Matrix, ValueType::Scalar], ValueType::Vector),
        ("present_over_time", vec![ValueType::Matrix], ValueType::Vector),
        ("quantile_over_time", vec![ValueType::Scalar, ValueType::Matrix], ValueType::Vector),
        ("rate", vec![ValueType::Matrix], ValueType::Vector),
        ("resets", vec![ValueType::Matrix], ValueType::Vector),
        ("round", vec![ValueType::Vector, ValueType::Scalar], ValueType::Vector),
        ("scalar", vec![ValueType::Vector], ValueType::Scalar),
        ("sgn", vec![ValueType::Vector], ValueType::Vector),
        ("sort", vec![ValueType::Vector], ValueType::Vector),
        ("sort_desc", vec![ValueType::Vector], ValueType::Vector),
        ("sqrt", vec![ValueType::Vector], ValueType::Vector),
        ("stddev_over_time", vec![ValueType::Matrix], ValueType::Vector),
        ("stdvar_over_time", vec![ValueType::Matrix], ValueType::Vector),
        ("sum_over_time", vec![ValueType::Matrix], ValueType::Vector),
        ("time", vec![], ValueType::Scalar),
        ("timestamp", vec![ValueType::Vector], ValueType::Vector),
        ("vector", vec![ValueType::Scalar], ValueType::Vector),
        ("year", vec![ValueType::Vector], ValueType::Vector)
    );
}

/// get_function returns a predefined Function object for the given name.
pub fn get_function(name: &str) -> Option<&'static Function> {
    FUNCTIONS.get(name)
}

/// all registered functions, in no particular order.
pub fn all_functions() -> impl Iterator<Item = &'static Function> {
    FUNCTIONS.values()
}

/// names of the functions whose return type is `vt`.
pub fn function_names_returning(vt: ValueType) -> Vec<&'static str> {
    FUNCTIONS
        .values()
        .filter(|f| f.return_type == vt)
        .map(|f| f.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_function() {
        let f = get_function("rate").unwrap();
        assert_eq!(f.arg_types, vec![ValueType::Matrix]);
        assert!(!f.variadic);
        assert_eq!(f.return_type, ValueType::Vector);

        let f = get_function("round").unwrap();
        assert!(f.variadic);

        assert!(get_function("not_a_function").is_none());
    }

    #[test]
    fn test_scalar_vs_vector_split() {
        let scalar = function_names_returning(ValueType::Scalar);
        assert_eq!(
            {
                let mut s = scalar.clone();
                s.sort_unstable();
                s
            },
            vec!["pi", "scalar", "time"]
        );

        let vector = function_names_returning(ValueType::Vector);
        assert!(vector.contains(&"rate"));
        assert!(vector.contains(&"vector"));
        assert_eq!(vector.len() + scalar.len(), all_functions().count());
    }

    #[test]
    fn test_signature() {
        assert_eq!(
            get_function("rate").unwrap().signature(),
            "rate(range vector) -> instant vector"
        );
        assert_eq!(get_function("time").unwrap().signature(), "time() -> scalar");
        assert_eq!(
            get_function("round").unwrap().signature(),
            "round(instant vector, scalar, ...) -> instant vector"
        );
    }
}
