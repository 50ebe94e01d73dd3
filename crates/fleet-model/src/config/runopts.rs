use std::fmt;

use crate::{
    CfgValue, OptType, RunConfig,
    error::{ModelError, ModelResult},
};

/// Declaration of a single backend run option.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOpt {
    pub opt_type: OptType,
    pub help: String,
    pub default: Option<CfgValue>,
    pub required: bool,
}

impl fmt::Display for RunOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let default = match (&self.default, self.required) {
            (_, true) => "required".to_string(),
            (Some(d), false) => d.to_string(),
            (None, false) => "None".to_string(),
        };
        write!(f, "({}, {})\n        {}", self.opt_type, default, self.help)
    }
}

/// Typed registry of the run options a backend accepts.
///
/// Options keep their declaration order.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct RunOpts {
    opts: Vec<(String, RunOpt)>,
}

impl RunOpts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an option, replacing any previous declaration with the same name.
    ///
    /// Fails if the option is both `required` and has a `default`, or if the
    /// default is not an instance of `opt_type`.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        opt_type: OptType,
        help: impl Into<String>,
        default: Option<CfgValue>,
        required: bool,
    ) -> ModelResult<&mut Self> {
        let name = name.into();
        if required && default.is_some() {
            return Err(ModelError::InvalidOption {
                name,
                reason: "required options cannot have a default".into(),
            });
        }
        if let Some(d) = &default {
            if !opt_type.matches(d) {
                return Err(ModelError::InvalidOption {
                    reason: format!(
                        "default {d} is of type {}, expected {opt_type}",
                        d.type_name()
                    ),
                    name,
                });
            }
        }

        let opt = RunOpt {
            opt_type,
            help: help.into(),
            default,
            required,
        };
        match self.opts.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = opt,
            None => self.opts.push((name, opt)),
        }
        Ok(self)
    }

    /// Look up an option declaration.
    pub fn get(&self, name: &str) -> Option<&RunOpt> {
        self.opts.iter().find(|(n, _)| n == name).map(|(_, o)| o)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RunOpt)> {
        self.opts.iter().map(|(n, o)| (n.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.opts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opts.is_empty()
    }

    /// Returns `true` if `value` is present and an instance of `opt_type`.
    pub fn is_type(value: Option<&CfgValue>, opt_type: &OptType) -> bool {
        value.is_some_and(|v| opt_type.matches(v))
    }

    /// Validate `cfg` against the declared options and fill in defaults.
    ///
    /// Keys of `cfg` that are not declared here are copied through unchanged,
    /// so one config may carry options for several backends. All violations are
    /// reported together and nothing is returned unless every option is valid.
    /// `cfg` is never modified.
    pub fn resolve(&self, cfg: &RunConfig) -> ModelResult<RunConfig> {
        let mut resolved = RunConfig::new();
        let mut violations = Vec::new();

        for (name, opt) in &self.opts {
            match cfg.get(name) {
                Some(value) if opt.opt_type.matches(value) => {
                    resolved.set(name.clone(), value.clone());
                }
                Some(value) => violations.push(format!(
                    "option '{name}' expected {}, got {} ({value})",
                    opt.opt_type,
                    value.type_name()
                )),
                None if opt.required => {
                    violations.push(format!("required option '{name}' is missing"));
                }
                None => {
                    if let Some(default) = &opt.default {
                        resolved.set(name.clone(), default.clone());
                    }
                }
            }
        }

        if !violations.is_empty() {
            return Err(ModelError::InvalidRunConfig { violations });
        }

        for (key, value) in cfg.iter() {
            if self.get(key).is_none() {
                resolved.set(key, value.clone());
            }
        }
        Ok(resolved)
    }

    /// Parse a `key=value,key2=a;b` command-line string into a [`RunConfig`].
    ///
    /// Declared options are converted to their declared type; undeclared values
    /// stay strings (or string lists when they contain `;`).
    pub fn parse_cfg(&self, raw: &str) -> ModelResult<RunConfig> {
        let mut cfg = RunConfig::new();
        let mut violations = Vec::new();

        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                violations.push(format!("'{pair}' is not of the form key=value"));
                continue;
            };
            let key = key.trim();
            let parsed = match self.get(key) {
                Some(opt) => opt.opt_type.parse_value(value),
                None if value.contains(';') => {
                    OptType::list_of(OptType::Str).parse_value(value)
                }
                None => OptType::Str.parse_value(value),
            };
            match parsed {
                Ok(v) => {
                    cfg.set(key, v);
                }
                Err(e) => violations.push(format!("option '{key}': {e}")),
            }
        }

        if violations.is_empty() {
            Ok(cfg)
        } else {
            Err(ModelError::InvalidRunConfig { violations })
        }
    }
}

impl fmt::Display for RunOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, opt) in &self.opts {
            writeln!(f, "    {name} {opt}")?;
        }
        Ok(())
    }
}
