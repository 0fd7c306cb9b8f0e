//! Declaration modifiers.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Source modifiers of a type, member or parameter.
    ///
    /// Serialized as the flag names joined by `|`, e.g. `"PUBLIC | STATIC"`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Modifiers: u16 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const STATIC = 1 << 3;
        const FINAL = 1 << 4;
        const ABSTRACT = 1 << 5;
        const TRANSIENT = 1 << 6;
        const VOLATILE = 1 << 7;
        const SYNCHRONIZED = 1 << 8;
        const NATIVE = 1 << 9;
        const STRICTFP = 1 << 10;
        const DEFAULT = 1 << 11;

        /// Modifiers with no equivalent in the target language.
        const UNSUPPORTED = Self::TRANSIENT.bits()
            | Self::VOLATILE.bits()
            | Self::SYNCHRONIZED.bits()
            | Self::NATIVE.bits()
            | Self::STRICTFP.bits();
    }
}

impl Modifiers {
    #[inline]
    pub const fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    #[inline]
    pub const fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    pub fn visibility(self) -> Visibility {
        if self.contains(Self::PUBLIC) {
            Visibility::Public
        } else if self.contains(Self::PROTECTED) {
            Visibility::Protected
        } else if self.contains(Self::PRIVATE) {
            Visibility::Private
        } else {
            Visibility::Package
        }
    }

    /// Lower-case names of the unsupported modifiers present, in flag order.
    pub fn unsupported_names(self) -> Vec<&'static str> {
        self.intersection(Self::UNSUPPORTED)
            .iter_names()
            .map(|(name, _)| match name {
                "TRANSIENT" => "transient",
                "VOLATILE" => "volatile",
                "SYNCHRONIZED" => "synchronized",
                "NATIVE" => "native",
                _ => "strictfp",
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}
