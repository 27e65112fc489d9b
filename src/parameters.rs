/*!

Types associated with configuration parameters.

The parameter database is read from a JSON document at runtime; each record carries a name, a
type tag, a default value and a description. Applying a database onto an `Options` value gives
typed overrides with unknown-name and wrong-type errors.

*/

use std::collections::HashMap;

use json::{parse as parse_json, JsonValue};

use crate::config::Options;
use crate::errors::Error;

#[derive(Clone, PartialEq, Debug)]
pub enum ParameterValue {
  UnsignedInteger(u64),
  Bool(bool),
  Double(f64),
  Symbol(String),
}

#[derive(Clone, PartialEq, Debug)]
pub struct Parameter {
  pub name         : String,
  pub default_value: ParameterValue,
  pub description  : String,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Parameters {
  pub module     : String,
  pub description: String,
  parameters     : HashMap<String, Parameter>,
}

impl Parameters {
  pub fn get(&self, name: &str) -> Option<&ParameterValue> {
    self.parameters.get(name).map(|p| &p.default_value)
  }

  /// Applies every record onto `options`. Records must name known walk options and carry
  /// values of the declared type.
  pub fn apply_to(&self, options: &mut Options) -> Result<(), Error> {
    for (name, parameter) in self.parameters.iter() {
      match (name.as_str(), &parameter.default_value) {
        ("initial_phase", ParameterValue::Bool(b))            => options.set_initial_phase(*b),
        ("warmup", ParameterValue::Bool(b))                   => options.set_warmup(*b),
        ("walk_effort", ParameterValue::UnsignedInteger(n))   => options.set_walk_effort(*n),
        ("walk_min_effort", ParameterValue::UnsignedInteger(n)) => options.set_walk_min_effort(*n),
        ("verbosity", ParameterValue::UnsignedInteger(n))     => options.set_verbosity(*n as i32),
        ("initial_phase", _)
        | ("warmup", _)
        | ("walk_effort", _)
        | ("walk_min_effort", _)
        | ("verbosity", _) => return Err(Error::ParameterType(name.clone())),
        _ => return Err(Error::UnknownParameter(name.clone())),
      }
    }
    Ok(())
  }
}

fn json_value_to_parameter_value(datatype: &str, json_value: &JsonValue) -> Result<ParameterValue, Error> {
  let wrong_type = || Error::ParameterType(datatype.to_string());
  match datatype {
    "UINT"   => Ok(ParameterValue::UnsignedInteger(json_value.as_u64().ok_or_else(wrong_type)?)),
    "BOOL"   => Ok(ParameterValue::Bool(json_value.as_bool().ok_or_else(wrong_type)?)),
    "DOUBLE" => Ok(ParameterValue::Double(json_value.as_f64().ok_or_else(wrong_type)?)),
    "SYMBOL" => Ok(ParameterValue::Symbol(json_value.as_str().ok_or_else(wrong_type)?.to_string())),
    other    => Err(Error::UnknownParameter(other.to_string())),
  }
}

/// Builds the `Parameters` map from a JSON parameter-database document.
pub fn deserialize_parameters(source: &str) -> Result<Parameters, Error> {
  let object = parse_json(source).map_err(|_| Error::DeserializeParameters)?;
  let mut parameters = HashMap::new();

  let records = &object["parameters"];
  if !records.is_array() {
    return Err(Error::DeserializeParameters);
  }

  for record in records.members() {
    let name = record["param"].as_str().ok_or(Error::DeserializeParameters)?;
    let datatype = record["type"].as_str().ok_or(Error::DeserializeParameters)?;
    let parameter = Parameter {
      name: name.to_string(),
      default_value: json_value_to_parameter_value(datatype, &record["default"])?,
      description: record["description"].as_str().unwrap_or("").to_string(),
    };
    parameters.insert(name.to_string(), parameter);
  }

  Ok(Parameters {
    module: object["module"].as_str().unwrap_or("").to_string(),
    description: object["description"].as_str().unwrap_or("").to_string(),
    parameters,
  })
}


#[cfg(test)]
mod tests {
  use super::*;

  const WALK_PARAMETERS: &str = r#"{
    "module": "walk",
    "description": "random walk phase options",
    "parameters": [
      { "param": "warmup", "type": "BOOL", "default": true, "description": "warm up before walking" },
      { "param": "walk_effort", "type": "UINT", "default": 20, "description": "per mille of search ticks" },
      { "param": "verbosity", "type": "UINT", "default": 0, "description": "report level" }
    ]
  }"#;

  #[test]
  fn deserializes_and_applies_typed_overrides() {
    let parameters = deserialize_parameters(WALK_PARAMETERS).unwrap();
    assert_eq!(parameters.module, "walk");
    assert_eq!(parameters.get("warmup"), Some(&ParameterValue::Bool(true)));

    let mut options = Options::default();
    parameters.apply_to(&mut options).unwrap();
    assert!(options.warmup());
    assert_eq!(options.walk_effort(), 20);
    assert_eq!(options.verbosity(), 0);
  }

  #[test]
  fn unknown_parameters_are_rejected() {
    let source = r#"{
      "module": "walk",
      "description": "",
      "parameters": [
        { "param": "no_such_option", "type": "BOOL", "default": false, "description": "" }
      ]
    }"#;
    let parameters = deserialize_parameters(source).unwrap();
    let mut options = Options::default();
    match parameters.apply_to(&mut options) {
      Err(Error::UnknownParameter(name)) => assert_eq!(name, "no_such_option"),
      other => panic!("expected UnknownParameter, got {:?}", other),
    }
  }

  #[test]
  fn wrong_typed_parameters_are_rejected() {
    let source = r#"{
      "module": "walk",
      "description": "",
      "parameters": [
        { "param": "warmup", "type": "UINT", "default": 1, "description": "" }
      ]
    }"#;
    let parameters = deserialize_parameters(source).unwrap();
    let mut options = Options::default();
    assert!(matches!(parameters.apply_to(&mut options), Err(Error::ParameterType(_))));
  }

  #[test]
  fn malformed_documents_fail_to_deserialize() {
    assert!(matches!(
      deserialize_parameters("{ not json"),
      Err(Error::DeserializeParameters)
    ));
    assert!(matches!(
      deserialize_parameters(r#"{ "module": "walk", "parameters": 3 }"#),
      Err(Error::DeserializeParameters)
    ));
  }
}
