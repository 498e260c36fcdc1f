use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use owo_colors::AnsiColors;

/// Set by the handler from [install_ctrlc_handler]
pub static CTRLC_ISSUED: AtomicBool = AtomicBool::new(false);

/// Installs a Ctrl-C handler that only records the interrupt in
/// `CTRLC_ISSUED`. The process is not exited, so that pipeline cleanup (such
/// as removing a transfer volume) can still run after the interrupted child
/// process returns.
pub fn install_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_ISSUED.store(true, Ordering::SeqCst);
    })
}

/// Returns if `CTRLC_ISSUED` has been set
pub fn ctrlc_issued() -> bool {
    CTRLC_ISSUED.load(Ordering::SeqCst)
}

const TERMINAL_COLORS: [AnsiColors; 6] = [
    AnsiColors::Cyan,
    AnsiColors::Magenta,
    AnsiColors::Green,
    AnsiColors::Yellow,
    AnsiColors::Blue,
    AnsiColors::BrightCyan,
];

static COLOR_NUM: AtomicUsize = AtomicUsize::new(0);

/// Returns the next color in a cycle, so that consecutive commands get
/// visually distinct line prefixes
pub fn next_terminal_color() -> AnsiColors {
    let i = COLOR_NUM.fetch_add(1, Ordering::Relaxed);
    TERMINAL_COLORS[i % TERMINAL_COLORS.len()]
}
