use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// 消费/写入的起始位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartupMode {
    #[default]
    GroupOffsets,
    Earliest,
    Latest,
    Timestamp,
    SpecificOffsets,
}

const MODES: [(StartupMode, &str, &str); 5] = [
    (StartupMode::GroupOffsets, "group-offsets", "group_offsets"),
    (StartupMode::Earliest, "earliest-offset", "earliest"),
    (StartupMode::Latest, "latest-offset", "latest"),
    (StartupMode::Timestamp, "timestamp", "timestamp"),
    (StartupMode::SpecificOffsets, "specific-offsets", "specific_offsets"),
];

impl StartupMode {
    pub fn as_str(&self) -> &'static str {
        MODES
            .iter()
            .find(|(mode, _, _)| mode == self)
            .map(|(_, value, _)| *value)
            .unwrap_or("group-offsets")
    }
}

impl Display for StartupMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStartupMode(pub String);

impl Display for UnknownStartupMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown startup mode '{}'; allowed: group-offsets,earliest-offset,latest-offset,timestamp,specific-offsets",
            self.0
        )
    }
}

impl std::error::Error for UnknownStartupMode {}

impl FromStr for StartupMode {
    type Err = UnknownStartupMode;

    /// 接受取值（latest-offset）或枚举名（LATEST / group_offsets），不区分大小写
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        MODES
            .iter()
            .find(|(_, value, name)| key == *value || key == *name)
            .map(|(mode, _, _)| *mode)
            .ok_or_else(|| UnknownStartupMode(s.to_string()))
    }
}

impl Serialize for StartupMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StartupMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ModeVisitor;

        impl Visitor<'_> for ModeVisitor {
            type Value = StartupMode;

            fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str("a kafka startup mode string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<StartupMode, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(ModeVisitor)
    }
}
