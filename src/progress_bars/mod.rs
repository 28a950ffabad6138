use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::{fmt::Write, time::Duration};

const PROGRESS_CHARS: &str = "━━";

const MAIN_TEMPLATE: &str = "{spinner:.green.bold} {elapsed_precise:.bold} {wide_bar:.green/white.dim} {percent:.bold}  {pos:.green} ({msg:.bold.blue} | eta. {eta:.blue})";

/// Main bar tracking processed images across the whole run, sized from the
/// query's reported total.
pub fn migration_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len).with_style(migration_progress_style());
    bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(60));
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn migration_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(MAIN_TEMPLATE)
        .unwrap()
        .with_key("pos", |state: &ProgressState, w: &mut dyn Write| {
            write!(w, "{}/{}", state.pos(), state.len().unwrap()).unwrap();
        })
        .with_key("percent", |state: &ProgressState, w: &mut dyn Write| {
            write!(w, "{:>3.0}%", state.fraction() * 100_f32).unwrap();
        })
        .progress_chars(PROGRESS_CHARS)
}
