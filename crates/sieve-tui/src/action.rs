/// Actions the TUI can process, mapped from keyboard input or internal
/// events. The first five are the triage surface; the rest are the
/// terminal's own concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    NextItem,
    PreviousItem,
    OpenCurrent,
    SaveCurrent,
    ReloadSieve,
    Quit,
    ToggleHelp,
    Tick,
    Resize(u16, u16),
    None,
}
