//! Controller behavior against the in-memory EC

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crosec_transport::{CancelToken, MemoryDevice, Rgb, RgbWrite};
use framework_rgb::{AnimationKind, Preset, RgbController, LED_COUNT};

fn controller() -> (MemoryDevice, RgbController) {
    let device = MemoryDevice::new();
    let controller = RgbController::new(Arc::new(device.clone()));
    (device, controller)
}

fn preset(colors: &[&str], animation: AnimationKind) -> Preset {
    Preset::new("Test", colors.iter().copied(), animation)
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    done()
}

const RAINBOW: [&str; 8] = [
    "#ff0000", "0xFF8000", "ffff00", "#00ff00", "#00ffff", "#0000ff", "#8000ff", "#ff00ff",
];

#[test]
fn test_static_eight_colors_succeeds() {
    let (device, controller) = controller();
    let rainbow = preset(&RAINBOW, AnimationKind::Static);
    let result = controller.apply_preset(&rainbow, &CancelToken::none());

    assert!(result.succeeded(), "{:?}", result.error_message());
    assert_eq!(device.write_count(), 1);
    let write = &device.writes()[0];
    assert_eq!(write.start_key, 0);
    assert_eq!(write.colors.len(), LED_COUNT);
    assert_eq!(write.colors[0], Rgb::new(0xff, 0, 0));
    assert_eq!(write.colors[1], Rgb::new(0xff, 0x80, 0));
    assert!(!controller.is_animating());
}

#[test]
fn test_static_seven_colors_fails_without_io() {
    let (device, controller) = controller();
    let short = preset(&RAINBOW[..7], AnimationKind::Static);
    let result = controller.apply_preset(&short, &CancelToken::none());

    assert!(!result.succeeded());
    assert!(result
        .error_message()
        .unwrap()
        .contains("must contain exactly 8 colors"));
    assert_eq!(device.open_count(), 0);
}

#[test]
fn test_gradient_falls_back_to_full_list() {
    let (device, controller) = controller();
    let mut colors = ["0x000000"; 8];
    colors[5] = "0x00ff00";
    let cancel = CancelToken::new();

    let result = controller.apply_preset(&preset(&colors, AnimationKind::GradientSweep), &cancel);
    assert!(result.succeeded(), "{:?}", result.error_message());
    assert!(controller.is_animating());
    // Full list over 8 LEDs at offset 0 maps one to one
    assert_eq!(device.writes()[0].colors[5], Rgb::new(0, 0xff, 0));
    assert_eq!(device.writes()[0].colors[0], Rgb::BLACK);

    cancel.cancel();
}

#[test]
fn test_gradient_single_color_fails() {
    let (device, controller) = controller();
    let result = controller.apply_preset(
        &preset(&["0x000000"], AnimationKind::GradientSweep),
        &CancelToken::none(),
    );
    assert!(!result.succeeded());
    assert!(result.error_message().unwrap().contains("at least two colors"));
    assert_eq!(device.write_count(), 0);
}

#[test]
fn test_breathe_all_black_fails() {
    let (device, controller) = controller();
    let result = controller.apply_preset(
        &preset(&["0x000000"; 8], AnimationKind::Breathe),
        &CancelToken::none(),
    );
    assert!(!result.succeeded());
    assert!(result
        .error_message()
        .unwrap()
        .contains("at least one non-black color"));
    assert_eq!(device.write_count(), 0);
}

#[test]
fn test_breathe_first_frame_is_dark() {
    let (device, controller) = controller();
    let mut colors = ["0x000000"; 8];
    colors[2] = "#3366ff";
    let cancel = CancelToken::new();

    let result = controller.apply_preset(&preset(&colors, AnimationKind::Breathe), &cancel);
    assert!(result.succeeded());
    assert_eq!(device.writes()[0].colors, vec![Rgb::BLACK; LED_COUNT]);

    // Later frames light up with the single palette color
    let lit = |w: &RgbWrite| {
        w.colors
            .iter()
            .all(|&c| c != Rgb::BLACK && c.b >= c.g && c.g >= c.r)
    };
    let any_lit = || device.writes().iter().any(|w| lit(w));
    assert!(wait_until(Duration::from_secs(5), any_lit));

    cancel.cancel();
    let stopped = || !controller.is_animating();
    assert!(wait_until(Duration::from_secs(5), stopped));
}

#[test]
fn test_new_preset_replaces_running_loop() {
    let (device, controller) = controller();
    let cancel = CancelToken::new();

    let breathe = preset(&["#ff0000"], AnimationKind::Breathe);
    assert!(controller.apply_preset(&breathe, &cancel).succeeded());
    assert!(wait_until(Duration::from_secs(5), || device.write_count() >= 2));

    let green = ["#00ff00"; 8];
    assert!(controller
        .apply_preset(&preset(&green, AnimationKind::Static), &cancel)
        .succeeded());
    assert!(!controller.is_animating());

    // The breathe worker was joined before the static frame went out
    thread::sleep(Duration::from_millis(200));
    let writes = device.writes();
    let green_frame = vec![Rgb::new(0, 0xff, 0); LED_COUNT];
    let first_green = writes
        .iter()
        .position(|w| w.colors == green_frame)
        .unwrap();

    // Nothing from the breathe loop after the static frame
    assert_eq!(first_green, writes.len() - 1);
    assert!(writes[..first_green]
        .iter()
        .all(|w| w.colors.iter().all(|c| c.g == 0 && c.b == 0)));
}

#[test]
fn test_controller_rejection_reports_status() {
    let (device, controller) = controller();
    device.set_status(0x3);
    let rainbow = preset(&RAINBOW, AnimationKind::Static);
    let result = controller.apply_preset(&rainbow, &CancelToken::none());

    assert!(!result.succeeded());
    let message = result.error_message().unwrap();
    assert!(message.starts_with("EC RGB update failed:"), "{message}");
    assert!(message.contains("0x3"), "{message}");
}

#[test]
fn test_rejected_first_frame_starts_no_loop() {
    let (device, controller) = controller();
    device.set_status(0x1A);
    let result = controller.apply_preset(
        &preset(&["#ff0000", "#0000ff"], AnimationKind::GradientSweep),
        &CancelToken::none(),
    );
    assert!(!result.succeeded());
    assert!(result.error_message().unwrap().contains("0x1A"));
    assert!(!controller.is_animating());
}

#[test]
fn test_device_unavailable_reports_code() {
    let (device, controller) = controller();
    device.fail_open(Some(2));
    let rainbow = preset(&RAINBOW, AnimationKind::Static);
    let result = controller.apply_preset(&rainbow, &CancelToken::none());
    assert!(!result.succeeded());
    assert!(result.error_message().unwrap().starts_with("EC RGB update failed:"));
}

#[test]
fn test_canceled_before_apply() {
    let (device, controller) = controller();
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = controller.apply_preset(&preset(&RAINBOW, AnimationKind::Static), &cancel);
    assert_eq!(result.error_message(), Some("RGB apply was canceled."));
    assert_eq!(device.write_count(), 0);
}

#[test]
fn test_invalid_color_text_fails_before_io() {
    let (device, controller) = controller();
    let mut colors = RAINBOW;
    colors[4] = "#12345";
    let broken = preset(&colors, AnimationKind::Static);
    let result = controller.apply_preset(&broken, &CancelToken::none());
    assert!(!result.succeeded());
    assert!(result.error_message().unwrap().contains("#12345"));
    assert_eq!(device.open_count(), 0);
}
