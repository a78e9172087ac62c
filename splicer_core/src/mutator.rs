use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// A configured strategy name that is not one of the built-in strategies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown built-in mutator {0:?}")]
pub struct UnknownMutator(pub String);

/// Tags every mutation strategy the dispatcher knows how to run.
///
/// A registry is simply a `Vec<MutatorKind>`; the dispatcher draws a uniform
/// index into it and runs the strategy behind the tag. Order in a registry
/// only defines that index mapping, never a priority.
///
/// Deserializes from a report name, accepting only the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum MutatorKind {
    EraseBytes,
    InsertByte,
    InsertRepeatedBytes,
    ChangeByte,
    ChangeBit,
    ShuffleBytes,
    ChangeAsciiInteger,
    ChangeBinaryInteger,
    CopyPart,
    CrossOver,
    AddWordFromManualDictionary,
    AddWordFromTemporaryAutoDictionary,
    AddWordFromPersistentAutoDictionary,
    /// Delegates to the user's [`crate::hooks::CustomMutator`].
    Custom,
    /// Delegates to the user's [`crate::hooks::CustomCrossOver`].
    CustomCrossOver,
}

impl MutatorKind {
    /// The built-in strategies, used when no custom mutator is configured.
    pub const DEFAULT: [MutatorKind; 13] = [
        MutatorKind::EraseBytes,
        MutatorKind::InsertByte,
        MutatorKind::InsertRepeatedBytes,
        MutatorKind::ChangeByte,
        MutatorKind::ChangeBit,
        MutatorKind::ShuffleBytes,
        MutatorKind::ChangeAsciiInteger,
        MutatorKind::ChangeBinaryInteger,
        MutatorKind::CopyPart,
        MutatorKind::CrossOver,
        MutatorKind::AddWordFromManualDictionary,
        MutatorKind::AddWordFromTemporaryAutoDictionary,
        MutatorKind::AddWordFromPersistentAutoDictionary,
    ];

    /// Short name used in mutation sequence reports.
    pub fn name(self) -> &'static str {
        match self {
            MutatorKind::EraseBytes => "EraseBytes",
            MutatorKind::InsertByte => "InsertByte",
            MutatorKind::InsertRepeatedBytes => "InsertRepeatedBytes",
            MutatorKind::ChangeByte => "ChangeByte",
            MutatorKind::ChangeBit => "ChangeBit",
            MutatorKind::ShuffleBytes => "ShuffleBytes",
            MutatorKind::ChangeAsciiInteger => "ChangeASCIIInt",
            MutatorKind::ChangeBinaryInteger => "ChangeBinInt",
            MutatorKind::CopyPart => "CopyPart",
            MutatorKind::CrossOver => "CrossOver",
            MutatorKind::AddWordFromManualDictionary => "AddFromManualDict",
            MutatorKind::AddWordFromTemporaryAutoDictionary => "AddFromTempAutoDict",
            MutatorKind::AddWordFromPersistentAutoDictionary => "AddFromPersAutoDict",
            MutatorKind::Custom => "Custom",
            MutatorKind::CustomCrossOver => "CustomCrossOver",
        }
    }

    /// Looks a built-in strategy up by its report name.
    ///
    /// The hook tags are rejected since they only run when a hook is installed.
    pub fn from_builtin_name(name: &str) -> Option<Self> {
        MutatorKind::DEFAULT
            .into_iter()
            .find(|kind| kind.name() == name)
    }
}

impl TryFrom<String> for MutatorKind {
    type Error = UnknownMutator;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        MutatorKind::from_builtin_name(&name).ok_or(UnknownMutator(name))
    }
}

impl fmt::Display for MutatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
