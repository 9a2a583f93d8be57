//! Controller facade: validates a preset, starts its animation and reports a
//! uniform [`ApplyResult`].

use std::time::Duration;

use crosec_transport::{CancelToken, Rgb, SharedDevice};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::animation::{
    self, Animation, AnimationEngine, AnimationError, Breathe, Frame, GradientSweep, LED_COUNT,
};
use crate::color::{self, ColorError};
use crate::preset::{AnimationKind, Preset};

/// Name of the lit device used in validation messages
pub const DEVICE_NAME: &str = "Framework Cooler Master ARGB";

/// Why a preset could not be applied
///
/// The `Display` text is the message handed back to the caller.
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Preset '{name}' contains an invalid color: {source}")]
    InvalidColor {
        name: String,
        #[source]
        source: ColorError,
    },

    #[error(
        "Preset '{name}' must contain exactly {} colors for the {} fan.",
        LED_COUNT,
        DEVICE_NAME
    )]
    WrongColorCount { name: String },

    #[error("Gradient sweep requires at least two colors.")]
    GradientNeedsTwoColors,

    #[error("Breathe requires at least one non-black color.")]
    BreatheNeedsColor,

    #[error("RGB apply was canceled.")]
    Canceled,

    #[error("EC RGB update failed: {0}")]
    Update(#[source] AnimationError),
}

impl ApplyError {
    /// Whether a later attempt could succeed; only device failures qualify
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApplyError::Update(_))
    }
}

impl From<AnimationError> for ApplyError {
    fn from(e: AnimationError) -> Self {
        if e.is_canceled() {
            ApplyError::Canceled
        } else {
            ApplyError::Update(e)
        }
    }
}

/// Terminal outcome of one apply call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    succeeded: bool,
    error_message: Option<String>,
}

impl ApplyResult {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            error_message: Some(message.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn into_result(self) -> Result<(), String> {
        match self.error_message {
            None => Ok(()),
            Some(message) => Err(message),
        }
    }
}

impl From<Result<(), ApplyError>> for ApplyResult {
    fn from(result: Result<(), ApplyError>) -> Self {
        match result {
            Ok(()) => ApplyResult::success(),
            Err(e) => ApplyResult::failure(e.to_string()),
        }
    }
}

/// Single entry point for applying presets to the fan
pub struct RgbController {
    engine: AnimationEngine,
}

impl RgbController {
    pub fn new(device: SharedDevice) -> Self {
        Self {
            engine: AnimationEngine::new(device),
        }
    }

    /// Apply `preset`, replacing any running animation
    ///
    /// Succeeds once the first frame is on the device; looping animations
    /// keep running in the background until `cancel` fires, another preset is
    /// applied, or [`RgbController::stop`] is called.
    pub fn apply_preset(&self, preset: &Preset, cancel: &CancelToken) -> ApplyResult {
        let result = self.try_apply(preset, cancel);
        if let Err(ref e) = result {
            warn!("Applying preset '{}' failed: {}", preset.name, e);
        }
        result.into()
    }

    /// Like [`RgbController::apply_preset`], keeping the typed error
    pub fn try_apply(&self, preset: &Preset, cancel: &CancelToken) -> Result<(), ApplyError> {
        let animation = prepare(preset)?;
        debug!("Applying preset '{}' as {}", preset.name, animation.name());
        self.engine.start(animation, cancel)?;
        Ok(())
    }

    /// Apply `preset`, retrying failed attempts after `delay`
    ///
    /// Validation errors and cancellation are not retried. The wait between
    /// attempts ends early when `cancel` fires.
    pub fn apply_with_retry(
        &self,
        preset: &Preset,
        cancel: &CancelToken,
        attempts: u32,
        delay: Duration,
    ) -> ApplyResult {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            let e = match self.try_apply(preset, cancel) {
                Ok(()) => return ApplyResult::success(),
                Err(e) => e,
            };
            if !e.is_retryable() || attempt >= attempts {
                warn!(
                    "Applying preset '{}' failed after {} attempt(s): {}",
                    preset.name, attempt, e
                );
                return ApplyResult::failure(e.to_string());
            }
            info!(
                "Attempt {}/{} for preset '{}' failed: {}",
                attempt, attempts, preset.name, e
            );

            if cancel.wait_timeout(delay) {
                return ApplyResult::failure(ApplyError::Canceled.to_string());
            }
            attempt += 1;
        }
    }

    /// Stop the background animation, if any
    pub fn stop(&self) {
        self.engine.stop();
    }

    pub fn is_animating(&self) -> bool {
        self.engine.is_running()
    }
}

/// Validate a preset and build its animation, without touching the device
pub fn prepare(preset: &Preset) -> Result<Animation, ApplyError> {
    let colors = resolve_colors(preset)?;

    match preset.animation {
        AnimationKind::GradientSweep => GradientSweep::new(animation::gradient_palette(&colors))
            .map(|r| Animation::Looping(Box::new(r)))
            .ok_or(ApplyError::GradientNeedsTwoColors),
        AnimationKind::Breathe => Breathe::new(animation::breathe_palette(&colors))
            .map(|r| Animation::Looping(Box::new(r)))
            .ok_or(ApplyError::BreatheNeedsColor),
        AnimationKind::Static => {
            let frame: Frame = colors
                .as_slice()
                .try_into()
                .map_err(|_| ApplyError::WrongColorCount {
                    name: preset.name.clone(),
                })?;
            Ok(Animation::Static(frame))
        }
    }
}

/// Normalize and parse every color of the preset
fn resolve_colors(preset: &Preset) -> Result<Vec<Rgb>, ApplyError> {
    preset
        .colors
        .iter()
        .map(|text| {
            color::normalize(text)
                .and_then(|canonical| color::parse(&canonical))
                .map_err(|source| ApplyError::InvalidColor {
                    name: preset.name.clone(),
                    source,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(colors: &[&str], animation: AnimationKind) -> Preset {
        Preset::new("Test", colors.iter().copied(), animation)
    }

    #[test]
    fn test_prepare_static_requires_eight() {
        let ok = preset(&["#ff0000"; 8], AnimationKind::Static);
        assert!(matches!(prepare(&ok), Ok(Animation::Static(_))));

        let short = preset(&["#ff0000"; 7], AnimationKind::Static);
        let err = prepare(&short).err().unwrap();
        assert_eq!(
            err.to_string(),
            "Preset 'Test' must contain exactly 8 colors for the Framework Cooler Master ARGB fan."
        );
    }

    #[test]
    fn test_prepare_rejects_bad_color() {
        let mut colors = ["0x000000"; 8];
        colors[2] = "0xZZ0000";
        let err = prepare(&preset(&colors, AnimationKind::Static)).err().unwrap();
        assert!(matches!(err, ApplyError::InvalidColor { .. }));
        assert!(err.to_string().contains("0xZZ0000"));
    }

    #[test]
    fn test_prepare_looping_names() {
        let colors = ["#ff0000", "#0000ff"];
        let breathe = prepare(&preset(&colors, AnimationKind::Breathe)).unwrap();
        assert_eq!(breathe.name(), "Breathe");
        let sweep = prepare(&preset(&colors, AnimationKind::GradientSweep)).unwrap();
        assert_eq!(sweep.name(), "GradientSweep");
    }

    #[test]
    fn test_looping_accepts_any_length() {
        let colors = ["#ff0000", "#00ff00", "#0000ff"];
        assert!(prepare(&preset(&colors, AnimationKind::GradientSweep)).is_ok());
        assert!(prepare(&preset(&colors[..1], AnimationKind::Breathe)).is_ok());
    }

    #[test]
    fn test_apply_result_accessors() {
        let ok = ApplyResult::success();
        assert!(ok.succeeded());
        assert_eq!(ok.error_message(), None);

        let failed = ApplyResult::failure("nope");
        assert!(!failed.succeeded());
        assert_eq!(failed.clone().into_result(), Err("nope".to_string()));
    }

    #[test]
    fn test_canceled_maps_to_message() {
        let err: ApplyError =
            AnimationError::Transport(crosec_transport::TransportError::Canceled).into();
        assert_eq!(err.to_string(), "RGB apply was canceled.");
    }

    #[test]
    fn test_retry_gives_up_after_attempts() {
        let device = crosec_transport::MemoryDevice::new();
        device.fail_io(Some(5));
        let controller = RgbController::new(std::sync::Arc::new(device.clone()));
        let rainbow = preset(&["#ff0000"; 8], AnimationKind::Static);

        let result = controller.apply_with_retry(
            &rainbow,
            &CancelToken::none(),
            3,
            Duration::from_millis(10),
        );
        assert!(!result.succeeded());
        assert!(result.error_message().unwrap().starts_with("EC RGB update failed"));
        assert_eq!(device.open_count(), 3);
    }

    #[test]
    fn test_retry_skips_validation_errors() {
        let device = crosec_transport::MemoryDevice::new();
        let controller = RgbController::new(std::sync::Arc::new(device.clone()));
        let short = preset(&["#ff0000"; 3], AnimationKind::Static);

        let result =
            controller.apply_with_retry(&short, &CancelToken::none(), 5, Duration::from_secs(60));
        assert!(!result.succeeded());
        assert_eq!(device.open_count(), 0);
    }

    #[test]
    fn test_retry_wait_is_cancelable() {
        let device = crosec_transport::MemoryDevice::new();
        device.fail_io(Some(5));
        let controller = RgbController::new(std::sync::Arc::new(device.clone()));
        let cancel = CancelToken::new();
        let timer = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            timer.cancel();
        });

        let rainbow = preset(&["#ff0000"; 8], AnimationKind::Static);
        let result = controller.apply_with_retry(&rainbow, &cancel, 5, Duration::from_secs(60));
        assert_eq!(result.error_message(), Some("RGB apply was canceled."));
        assert_eq!(device.open_count(), 1);
    }
}
