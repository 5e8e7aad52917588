/*
    Nyx, blazing fast astrodynamics
    Copyright (C) 2023 Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::errors::ErrorKind;
use crate::time::Epoch;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use snafu::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Fixed capacity buffers exchanged across a process or service boundary.
pub mod dto;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("failed to read configuration file {}: {source}", path.display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse YAML configuration: {source}"))]
    ParseError { source: serde_yaml::Error },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ReadError { .. } => ErrorKind::External,
            Self::ParseError { .. } => ErrorKind::InvalidArgument,
        }
    }
}

impl PartialEq for ConfigError {
    /// No two configuration errors match
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

fn open<P: AsRef<Path>>(path: P) -> Result<BufReader<File>, ConfigError> {
    let file = File::open(&path).context(ReadSnafu {
        path: path.as_ref().to_path_buf(),
    })?;
    Ok(BufReader::new(file))
}

pub trait ConfigRepr: Debug + Sized + Serialize + DeserializeOwned {
    /// Builds the configuration representation from the path to a yaml
    fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        serde_yaml::from_reader(open(path)?).context(ParseSnafu)
    }

    /// Builds a sequence of "Selves" from the provided path to a yaml
    fn load_many<P>(path: P) -> Result<Vec<Self>, ConfigError>
    where
        P: AsRef<Path>,
    {
        serde_yaml::from_reader(open(path)?).context(ParseSnafu)
    }

    /// Builds a map of names to "selves" from the provided path to a yaml
    fn load_named<P>(path: P) -> Result<BTreeMap<String, Self>, ConfigError>
    where
        P: AsRef<Path>,
    {
        serde_yaml::from_reader(open(path)?).context(ParseSnafu)
    }

    /// Builds a sequence of "Selves" from the provided string of a yaml
    fn loads_many(data: &str) -> Result<Vec<Self>, ConfigError> {
        debug!("Loading YAML:\n{data}");
        serde_yaml::from_str(data).context(ParseSnafu)
    }

    /// Builds a map of names to "selves" from the provided string of a yaml
    fn loads_named(data: &str) -> Result<BTreeMap<String, Self>, ConfigError> {
        debug!("Loading YAML:\n{data}");
        serde_yaml::from_str(data).context(ParseSnafu)
    }
}

pub(crate) fn epoch_to_str<S>(epoch: &Epoch, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{epoch}"))
}

/// A deserializer from Epoch string
pub(crate) fn epoch_from_str<'de, D>(deserializer: D) -> Result<Epoch, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Epoch::from_str(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod ut_io {
    use super::*;
    use serde_derive::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Timed {
        #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
        epoch: Epoch,
        hold_s: f64,
    }

    impl ConfigRepr for Timed {}

    #[test]
    fn epochs_as_strings() {
        let data = r#"
- epoch: 2021-06-02T00:00:00 UTC
  hold_s: 7200.0
"#;
        let timed = Timed::loads_many(data).unwrap();
        assert_eq!(timed.len(), 1);
        assert_eq!(timed[0].epoch, Epoch::from_gregorian_utc_at_midnight(2021, 6, 2));
        assert_eq!(timed[0].hold_s, 7200.0);

        let named = Timed::loads_named(
            r#"
burn:
  epoch: 2021-06-02T00:00:00 UTC
  hold_s: 1800.0
"#,
        )
        .unwrap();
        assert_eq!(named["burn"].epoch, Epoch::from_gregorian_utc_at_midnight(2021, 6, 2));
        assert_eq!(named["burn"].hold_s, 1800.0);
    }

    #[test]
    fn config_errors() {
        let err = Timed::load("does/not/exist.yaml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::External);
        // Configuration errors never compare equal
        assert_ne!(err, Timed::load("does/not/exist.yaml").unwrap_err());

        let err = Timed::loads_many("- epoch: not an epoch\n  hold_s: 1.0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
