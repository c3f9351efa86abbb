use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

pub const MIN_FREQUENCY_HZ: u64 = 144_000_000;
pub const MAX_FREQUENCY_HZ: u64 = 440_000_000;
pub const MIN_PASSBAND_HZ: u32 = 500;
pub const MAX_PASSBAND_HZ: u32 = 3_600;

pub const DEFAULT_RECEIVE_HZ: u64 = 437_800_000;
pub const DEFAULT_TRANSMIT_HZ: u64 = 145_990_000;
pub const DEFAULT_PASSBAND_HZ: u32 = 2_700;
pub const DEFAULT_SPLIT_HZ: u64 = 145_500_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingError {
    #[error("unknown {kind} \"{name}\"")]
    UnknownName { kind: &'static str, name: String },
    #[error("frequency {0} Hz outside 144000000..=440000000 Hz")]
    FrequencyOutOfRange(u64),
    #[error("passband {0} Hz outside 500..=3600 Hz")]
    PassbandOutOfRange(u32),
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum_macros::Display)]
#[serde(try_from = "String")]
pub enum Vfo {
    #[default]
    #[strum(serialize = "VFO A")]
    A,
    #[strum(serialize = "VFO B")]
    B,
    #[strum(serialize = "Current VFO")]
    Current,
}

impl Vfo {
    /// Token understood by rigctld.
    pub fn token(&self) -> &'static str {
        match self {
            Vfo::A => "VFOA",
            Vfo::B => "VFOB",
            Vfo::Current => "currVFO",
        }
    }
}

impl FromStr for Vfo {
    type Err = SettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "vfoa" | "a" => Ok(Vfo::A),
            "vfob" | "b" => Ok(Vfo::B),
            "currentvfo" | "current" | "currvfo" => Ok(Vfo::Current),
            _ => Err(SettingError::UnknownName {
                kind: "VFO",
                name: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Vfo {
    type Error = SettingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum_macros::Display)]
#[serde(try_from = "String")]
pub enum Mode {
    #[strum(serialize = "USB")]
    Usb,
    #[strum(serialize = "LSB")]
    Lsb,
    #[default]
    #[strum(serialize = "FM")]
    Fm,
    #[strum(serialize = "AM")]
    Am,
    #[strum(serialize = "CW")]
    Cw,
}

impl Mode {
    pub fn token(&self) -> &'static str {
        match self {
            Mode::Usb => "USB",
            Mode::Lsb => "LSB",
            // narrow FM is what the supported Icoms use for satellite work
            Mode::Fm => "FMN",
            Mode::Am => "AM",
            Mode::Cw => "CW",
        }
    }
}

impl FromStr for Mode {
    type Err = SettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "usb" => Ok(Mode::Usb),
            "lsb" => Ok(Mode::Lsb),
            "fm" | "fmn" => Ok(Mode::Fm),
            "am" => Ok(Mode::Am),
            "cw" => Ok(Mode::Cw),
            _ => Err(SettingError::UnknownName {
                kind: "mode",
                name: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = SettingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Supported transceivers and their Hamlib model numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum RigModel {
    #[default]
    IcomIc705,
    IcomIc7300,
    IcomIc7760,
}

impl RigModel {
    pub const ALL: [RigModel; 3] = [
        RigModel::IcomIc705,
        RigModel::IcomIc7300,
        RigModel::IcomIc7760,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RigModel::IcomIc705 => "Icom IC-705",
            RigModel::IcomIc7300 => "Icom IC-7300",
            RigModel::IcomIc7760 => "Icom IC-7760",
        }
    }

    pub fn hamlib_id(&self) -> u32 {
        match self {
            RigModel::IcomIc705 => 3085,
            RigModel::IcomIc7300 => 3073,
            RigModel::IcomIc7760 => 3092,
        }
    }
}

impl fmt::Display for RigModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RigModel {
    type Err = SettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        RigModel::ALL
            .into_iter()
            .find(|m| normalize(m.name()) == wanted || m.hamlib_id().to_string() == wanted)
            .ok_or_else(|| SettingError::UnknownName {
                kind: "rig",
                name: s.to_string(),
            })
    }
}

impl TryFrom<String> for RigModel {
    type Error = SettingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One receive or transmit channel: where and how to tune.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSetting {
    pub vfo: Vfo,
    pub mode: Mode,
    pub frequency_hz: u64,
    pub passband_hz: u32,
}

impl ChannelSetting {
    pub fn new(
        vfo: Vfo,
        mode: Mode,
        frequency_hz: u64,
        passband_hz: u32,
    ) -> Result<Self, SettingError> {
        if !(MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&frequency_hz) {
            return Err(SettingError::FrequencyOutOfRange(frequency_hz));
        }
        if !(MIN_PASSBAND_HZ..=MAX_PASSBAND_HZ).contains(&passband_hz) {
            return Err(SettingError::PassbandOutOfRange(passband_hz));
        }
        Ok(Self {
            vfo,
            mode,
            frequency_hz,
            passband_hz,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vfo_names() {
        assert_eq!("VFO A".parse::<Vfo>().unwrap(), Vfo::A);
        assert_eq!("vfo b".parse::<Vfo>().unwrap(), Vfo::B);
        assert_eq!("Current VFO".parse::<Vfo>().unwrap(), Vfo::Current);
        assert_eq!("Current".parse::<Vfo>().unwrap(), Vfo::Current);
        assert_eq!(Vfo::B.to_string(), "VFO B");
        assert_eq!(Vfo::default(), Vfo::A);
    }

    #[test]
    fn unknown_names_are_errors() {
        assert_eq!(
            "VFO Q".parse::<Vfo>(),
            Err(SettingError::UnknownName {
                kind: "VFO",
                name: "VFO Q".into()
            })
        );
        assert!("WFM".parse::<Mode>().is_err());
        assert!("Yaesu FT-991".parse::<RigModel>().is_err());
    }

    #[test]
    fn mode_tokens() {
        assert_eq!("FM".parse::<Mode>().unwrap().token(), "FMN");
        assert_eq!("usb".parse::<Mode>().unwrap(), Mode::Usb);
        assert_eq!(Mode::Cw.to_string(), "CW");
    }

    #[test]
    fn rig_models() {
        assert_eq!("Icom IC-705".parse::<RigModel>().unwrap().hamlib_id(), 3085);
        assert_eq!("icom ic7300".parse::<RigModel>().unwrap().hamlib_id(), 3073);
        assert_eq!("3092".parse::<RigModel>().unwrap(), RigModel::IcomIc7760);
    }

    #[test]
    fn channel_limits() {
        let channel =
            ChannelSetting::new(Vfo::A, Mode::Fm, DEFAULT_RECEIVE_HZ, DEFAULT_PASSBAND_HZ);
        assert!(channel.is_ok());
        assert_eq!(
            ChannelSetting::new(Vfo::A, Mode::Fm, 1_296_000_000, 2_700),
            Err(SettingError::FrequencyOutOfRange(1_296_000_000))
        );
        assert_eq!(
            ChannelSetting::new(Vfo::A, Mode::Fm, 145_800_000, 12_000),
            Err(SettingError::PassbandOutOfRange(12_000))
        );
    }

    #[test]
    fn deserialize_from_yaml() {
        let vfo: Vfo = serde_yaml::from_str("VFO B").unwrap();
        assert_eq!(vfo, Vfo::B);
        assert!(serde_yaml::from_str::<Mode>("PKT").is_err());
    }
}
