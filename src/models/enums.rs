use crate::db::StorageError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = StorageError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(StorageError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(MedicationType {
    Tablet => "tablet",
    Capsule => "capsule",
    Liquid => "liquid",
    Ointment => "ointment",
    Injection => "injection",
});

str_enum!(DoseStatus {
    Pending => "pending",
    Taken => "taken",
    Skipped => "skipped",
    Delayed => "delayed",
});

str_enum!(FontSize {
    Normal => "normal",
    Large => "large",
    ExtraLarge => "extra_large",
});

impl MedicationType {
    /// Label shown on the add form and medication cards.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tablet => "Comprimido",
            Self::Capsule => "Cápsula",
            Self::Liquid => "Líquido",
            Self::Ointment => "Pomada",
            Self::Injection => "Injeção",
        }
    }
}

impl DoseStatus {
    /// Label used by the history screen and the day report.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Taken => "Tomado",
            Self::Skipped => "Pulado",
            Self::Delayed => "Adiado",
        }
    }

    /// A user decision was recorded (anything but pending).
    pub fn is_decision(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}
