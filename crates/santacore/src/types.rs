use std::fmt;
use std::str::FromStr;

/// How the participant wants to receive the gift.
///
/// Persisted as a stable discriminant (`pickup` / `home`); the localized label
/// shown to users lives in the bot's i18n layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeliveryOption {
    /// Parcel pickup point
    #[default]
    Pickup,
    /// Courier delivery to the door
    Home,
}

impl DeliveryOption {
    /// Both options in the order they are offered to the user.
    pub const ALL: [DeliveryOption; 2] = [DeliveryOption::Pickup, DeliveryOption::Home];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOption::Pickup => "pickup",
            DeliveryOption::Home => "home",
        }
    }

    /// The other option, used by the admin panel toggle.
    pub fn toggled(&self) -> Self {
        match self {
            DeliveryOption::Pickup => DeliveryOption::Home,
            DeliveryOption::Home => DeliveryOption::Pickup,
        }
    }
}

impl fmt::Display for DeliveryOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pickup" => Ok(DeliveryOption::Pickup),
            "home" => Ok(DeliveryOption::Home),
            _ => Err(format!("Unknown delivery option: {}", s)),
        }
    }
}

// rusqlite FromSql: read option from DB text column
impl rusqlite::types::FromSql for DeliveryOption {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        DeliveryOption::from_str(s)
            .map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(std::io::Error::other(e))))
    }
}

// rusqlite ToSql: write option as text to DB
impl rusqlite::types::ToSql for DeliveryOption {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::Borrowed(rusqlite::types::ValueRef::Text(
            self.as_str().as_bytes(),
        )))
    }
}

impl serde::Serialize for DeliveryOption {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
