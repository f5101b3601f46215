//! Per-operation storage selection policies

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where to look for an object when checking existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistsPolicy {
    /// Only the first used storage
    First,
    /// Any storage, stopping at the first that has it
    Any,
    /// Every storage, stopping at the first that lacks it
    All,
}

/// Where to read an object from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPolicy {
    /// Only the first used storage
    First,
    /// The first storage that has the object
    FoundFirst,
}

/// How to list a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListPolicy {
    /// Only the first used storage
    First,
    /// Every storage, each object name taken from the first storage having it
    FoundFirst,
    /// Every storage, all objects tagged with their storage
    All,
}

/// Where to write an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PutPolicy {
    /// Only the first used storage
    First,
    /// The first storage that already has the object, else the first one
    UpdateFirstFound,
    /// Every storage
    All,
    /// Every storage that already has the object, else the first one
    UpdateAllFound,
}

/// Where to delete objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    First,
    All,
}

/// Where to copy objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyPolicy {
    First,
    All,
}

/// Policy bundle attached to a multi-storage folder
///
/// A plain value: sub-folders get their own copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policies {
    pub exists: ExistsPolicy,
    pub read: ReadPolicy,
    pub list: ListPolicy,
    pub put: PutPolicy,
    pub delete: DeletePolicy,
    pub copy: CopyPolicy,
}

impl Policies {
    /// Work with the first used storage only
    pub const TAKE_FIRST_STORAGE: Policies = Policies {
        exists: ExistsPolicy::First,
        read: ReadPolicy::First,
        list: ListPolicy::First,
        put: PutPolicy::First,
        delete: DeletePolicy::First,
        copy: CopyPolicy::First,
    };

    /// Treat all used storages as one, listing every copy of every object
    pub const UNITE_ALL_STORAGES: Policies = Policies {
        exists: ExistsPolicy::Any,
        read: ReadPolicy::FoundFirst,
        list: ListPolicy::All,
        put: PutPolicy::UpdateFirstFound,
        delete: DeletePolicy::All,
        copy: CopyPolicy::All,
    };

    /// Treat all used storages as one, listing each object name once
    pub const MERGE_ALL_STORAGES: Policies = Policies {
        exists: ExistsPolicy::Any,
        read: ReadPolicy::FoundFirst,
        list: ListPolicy::FoundFirst,
        put: PutPolicy::UpdateFirstFound,
        delete: DeletePolicy::All,
        copy: CopyPolicy::All,
    };
}

impl Default for Policies {
    fn default() -> Self {
        Policies::TAKE_FIRST_STORAGE
    }
}

/// Named policy presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyPreset {
    #[default]
    TakeFirst,
    UniteAll,
    MergeAll,
}

impl PolicyPreset {
    pub fn policies(self) -> Policies {
        match self {
            PolicyPreset::TakeFirst => Policies::TAKE_FIRST_STORAGE,
            PolicyPreset::UniteAll => Policies::UNITE_ALL_STORAGES,
            PolicyPreset::MergeAll => Policies::MERGE_ALL_STORAGES,
        }
    }
}

impl FromStr for PolicyPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "take_first" => Ok(PolicyPreset::TakeFirst),
            "unite_all" => Ok(PolicyPreset::UniteAll),
            "merge_all" => Ok(PolicyPreset::MergeAll),
            other => Err(Error::Configuration(format!(
                "unknown policy preset {other:?}, expected take_first, unite_all or merge_all"
            ))),
        }
    }
}

impl fmt::Display for PolicyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyPreset::TakeFirst => "take_first",
            PolicyPreset::UniteAll => "unite_all",
            PolicyPreset::MergeAll => "merge_all",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_take_first() {
        assert_eq!(Policies::default(), Policies::TAKE_FIRST_STORAGE);
    }

    #[test]
    fn test_merge_differs_from_unite_only_in_listing() {
        let unite = Policies::UNITE_ALL_STORAGES;
        let merge = Policies::MERGE_ALL_STORAGES;
        assert_eq!(unite.list, ListPolicy::All);
        assert_eq!(merge.list, ListPolicy::FoundFirst);
        assert_eq!(Policies { list: merge.list, ..unite }, merge);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!("unite-all".parse::<PolicyPreset>().unwrap(), PolicyPreset::UniteAll);
        assert_eq!(
            "MERGE_ALL".parse::<PolicyPreset>().unwrap().policies(),
            Policies::MERGE_ALL_STORAGES
        );
        assert!("everything".parse::<PolicyPreset>().is_err());
    }
}
