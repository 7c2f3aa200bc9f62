//! Diagnostic filter graph.
//!
//! The diagnostic pass samples the video once per second, binarises luma,
//! downscales and runs `mpdecimate`, which logs a keep/drop verdict per
//! sample at debug verbosity. Timestamps are renormalised to the sample
//! index, so `pts_time` counts samples and equals seconds.

use crate::config::DetectionSettings;

/// Samples per second analysed by the diagnostic pass.
///
/// Fixed at one: the reducer's terminal boundary relies on sample index and
/// seconds coinciding.
pub const DIAGNOSTIC_SAMPLE_FPS: u32 = 1;

/// Build the diagnostic filter graph for the given detection settings.
pub fn diagnostic_graph(settings: &DetectionSettings) -> String {
    format!(
        "fps={fps},format=gray,lutyuv='y=if(gt(val,{luma}), 1,0)',scale={width}:-1,\
         mpdecimate=hi={hi}:lo={lo}:frac={frac},setpts=N/FRAME_RATE/TB,fps={fps}",
        fps = DIAGNOSTIC_SAMPLE_FPS,
        luma = settings.luma_threshold,
        width = settings.scale_width,
        hi = settings.mpdecimate_hi,
        lo = settings.mpdecimate_lo,
        frac = settings.mpdecimate_frac,
    )
}
