//! In-memory state behind an accessory's characteristics.
//!
//! No device is contacted: set handlers store what the controller sends and
//! get handlers answer from the stored value.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use trinnov_core::constants::{
    DEFAULT_BRIGHTNESS, DEFAULT_INPUT, DEFAULT_MUTE, DEFAULT_ON, DEFAULT_POWER, DEFAULT_VOLUME,
};
use trinnov_host::{CharacteristicType, CharacteristicValue, HostError};

/// Result of a characteristic handler.
pub type HandlerResult<T> = std::result::Result<T, HostError>;

/// Values an accessory reports to controllers.
///
/// Power, mute, input and on are kept in the form the controller wrote them,
/// so a get answers with exactly the value of the last set. Volume and
/// brightness are stored as sent, without range checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryState {
    pub power: CharacteristicValue,
    pub volume: i64,
    pub mute: CharacteristicValue,
    pub input: CharacteristicValue,
    pub on: CharacteristicValue,
    pub brightness: i64,
}

impl AccessoryState {
    pub fn is_powered(&self) -> bool {
        self.power.as_bool().unwrap_or(DEFAULT_POWER)
    }

    pub fn is_muted(&self) -> bool {
        self.mute.as_bool().unwrap_or(DEFAULT_MUTE)
    }

    pub fn is_on(&self) -> bool {
        self.on.as_bool().unwrap_or(DEFAULT_ON)
    }
}

impl Default for AccessoryState {
    fn default() -> Self {
        Self {
            power: CharacteristicValue::Bool(DEFAULT_POWER),
            volume: DEFAULT_VOLUME,
            mute: CharacteristicValue::Bool(DEFAULT_MUTE),
            input: CharacteristicValue::String(DEFAULT_INPUT.to_string()),
            on: CharacteristicValue::Bool(DEFAULT_ON),
            brightness: DEFAULT_BRIGHTNESS,
        }
    }
}

/// State shared between an adapter and the handlers it installs.
///
/// Each getter and setter is the body of one characteristic handler.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<AccessoryState>>,
}

impl SharedState {
    /// Create shared state holding the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the current values.
    pub fn snapshot(&self) -> AccessoryState {
        self.lock().clone()
    }

    pub fn set_power_state(&self, value: CharacteristicValue) -> HandlerResult<()> {
        check_bool(CharacteristicType::Active, &value)?;
        debug!("Set Characteristic Power -> {}", value);
        self.lock().power = value;
        Ok(())
    }

    pub fn get_power_state(&self) -> HandlerResult<CharacteristicValue> {
        let power = self.lock().power.clone();
        debug!("Get Characteristic Power -> {}", power);
        Ok(power)
    }

    pub fn set_input_state(&self, value: CharacteristicValue) -> HandlerResult<()> {
        check_input(&value)?;
        debug!("Set Characteristic Input -> {}", value);
        self.lock().input = value;
        Ok(())
    }

    pub fn get_input_state(&self) -> HandlerResult<CharacteristicValue> {
        let input = self.lock().input.clone();
        debug!("Get Characteristic Input -> {}", input);
        Ok(input)
    }

    pub fn set_mute(&self, value: CharacteristicValue) -> HandlerResult<()> {
        check_bool(CharacteristicType::Mute, &value)?;
        debug!("Set Characteristic Mute -> {}", value);
        self.lock().mute = value;
        Ok(())
    }

    pub fn get_mute(&self) -> HandlerResult<CharacteristicValue> {
        let mute = self.lock().mute.clone();
        debug!("Get Characteristic Mute -> {}", mute);
        Ok(mute)
    }

    pub fn set_volume(&self, value: CharacteristicValue) -> HandlerResult<()> {
        let volume = to_int(CharacteristicType::Volume, &value)?;
        self.lock().volume = volume;
        debug!("Set Characteristic Volume -> {}", value);
        Ok(())
    }

    pub fn get_volume(&self) -> HandlerResult<CharacteristicValue> {
        let volume = self.lock().volume;
        debug!("Get Characteristic Volume -> {}", volume);
        Ok(CharacteristicValue::Int(volume))
    }

    pub fn set_on(&self, value: CharacteristicValue) -> HandlerResult<()> {
        check_bool(CharacteristicType::On, &value)?;
        debug!("Set Characteristic On -> {}", value);
        self.lock().on = value;
        Ok(())
    }

    pub fn get_on(&self) -> HandlerResult<CharacteristicValue> {
        let on = self.lock().on.clone();
        debug!("Get Characteristic On -> {}", on);
        Ok(on)
    }

    pub fn set_brightness(&self, value: CharacteristicValue) -> HandlerResult<()> {
        let brightness = to_int(CharacteristicType::Brightness, &value)?;
        self.lock().brightness = brightness;
        debug!("Set Characteristic Brightness -> {}", value);
        Ok(())
    }

    pub fn get_brightness(&self) -> HandlerResult<CharacteristicValue> {
        let brightness = self.lock().brightness;
        debug!("Get Characteristic Brightness -> {}", brightness);
        Ok(CharacteristicValue::Int(brightness))
    }

    fn lock(&self) -> MutexGuard<'_, AccessoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn check_bool(kind: CharacteristicType, value: &CharacteristicValue) -> HandlerResult<()> {
    match value.as_bool() {
        Some(_) => Ok(()),
        None => Err(HostError::unsupported_value(kind, value.clone())),
    }
}

fn to_int(kind: CharacteristicType, value: &CharacteristicValue) -> HandlerResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| HostError::unsupported_value(kind, value.clone()))
}

// Input identifiers arrive as numbers from controllers and as names from
// configuration.
fn check_input(value: &CharacteristicValue) -> HandlerResult<()> {
    match value {
        CharacteristicValue::String(_) | CharacteristicValue::Int(_) => Ok(()),
        CharacteristicValue::Bool(_) => Err(HostError::unsupported_value(
            CharacteristicType::ActiveIdentifier,
            value.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let state = AccessoryState::default();
        assert!(state.is_powered());
        assert_eq!(state.volume, 100);
        assert!(!state.is_muted());
        assert_eq!(state.input, CharacteristicValue::from("HDMI 1"));
        assert!(state.is_on());
        assert_eq!(state.brightness, 100);
    }

    #[rstest]
    #[case(CharacteristicValue::Bool(false))]
    #[case(CharacteristicValue::Int(0))]
    #[case(CharacteristicValue::Int(1))]
    #[case(CharacteristicValue::Bool(true))]
    fn test_power_round_trip(#[case] value: CharacteristicValue) {
        let state = SharedState::new();
        state.set_power_state(value.clone()).unwrap();
        assert_eq!(state.get_power_state().unwrap(), value);
    }

    #[test]
    fn test_power_written_as_integer_still_reads_as_flag() {
        let state = SharedState::new();
        state.set_power_state(CharacteristicValue::Int(0)).unwrap();
        assert!(!state.snapshot().is_powered());
    }

    #[rstest]
    #[case(CharacteristicValue::String("HDMI 3".to_string()))]
    #[case(CharacteristicValue::Int(2))]
    fn test_input_round_trip(#[case] value: CharacteristicValue) {
        let state = SharedState::new();
        state.set_input_state(value.clone()).unwrap();
        assert_eq!(state.get_input_state().unwrap(), value);
    }

    #[test]
    fn test_mute_round_trip() {
        let state = SharedState::new();
        assert_eq!(state.get_mute().unwrap(), CharacteristicValue::Bool(false));

        state.set_mute(CharacteristicValue::Bool(true)).unwrap();
        assert_eq!(state.get_mute().unwrap(), CharacteristicValue::Bool(true));

        state.set_mute(CharacteristicValue::Int(0)).unwrap();
        assert_eq!(state.get_mute().unwrap(), CharacteristicValue::Int(0));
    }

    #[test]
    fn test_volume_round_trip() {
        let state = SharedState::new();
        state.set_volume(CharacteristicValue::Int(42)).unwrap();
        assert_eq!(state.get_volume().unwrap(), CharacteristicValue::Int(42));
    }

    #[test]
    fn test_volume_is_not_range_checked() {
        let state = SharedState::new();
        state.set_volume(CharacteristicValue::Int(250)).unwrap();
        assert_eq!(state.snapshot().volume, 250);
    }

    #[test]
    fn test_light_round_trip() {
        let state = SharedState::new();
        state.set_on(CharacteristicValue::Bool(false)).unwrap();
        state.set_brightness(CharacteristicValue::Int(30)).unwrap();

        assert_eq!(state.get_on().unwrap(), CharacteristicValue::Bool(false));
        assert_eq!(state.get_brightness().unwrap(), CharacteristicValue::Int(30));
    }

    #[rstest]
    #[case::volume_from_string(CharacteristicValue::String("loud".to_string()))]
    #[case::volume_from_bool(CharacteristicValue::Bool(true))]
    fn test_volume_rejects_non_integers(#[case] value: CharacteristicValue) {
        let state = SharedState::new();
        let result = state.set_volume(value);
        assert!(matches!(result, Err(HostError::UnsupportedValue { .. })));
        assert_eq!(state.snapshot().volume, 100);
    }

    #[test]
    fn test_mute_rejects_string() {
        let state = SharedState::new();
        let result = state.set_mute(CharacteristicValue::String("yes".to_string()));
        assert!(matches!(
            result,
            Err(HostError::UnsupportedValue {
                characteristic: CharacteristicType::Mute,
                ..
            })
        ));
    }

    #[test]
    fn test_input_rejects_bool() {
        let state = SharedState::new();
        assert!(state.set_input_state(CharacteristicValue::Bool(true)).is_err());
        assert_eq!(state.snapshot().input, CharacteristicValue::from("HDMI 1"));
    }

    #[test]
    fn test_clones_share_values() {
        let state = SharedState::new();
        let handler = state.clone();
        handler.set_mute(CharacteristicValue::Bool(true)).unwrap();
        assert!(state.snapshot().is_muted());
    }
}
