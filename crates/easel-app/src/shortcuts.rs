//! Keyboard shortcut registry.

use crate::session::ToolbarAction;

/// A keyboard shortcut bound to a toolbar action.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub action: ToolbarAction,
}

impl Shortcut {
    pub fn new(key: &'static str, ctrl: bool, shift: bool, action: ToolbarAction) -> Self {
        Self {
            key,
            ctrl,
            shift,
            action,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    fn matches(&self, key: &str, ctrl: bool, shift: bool) -> bool {
        self.key.eq_ignore_ascii_case(key) && self.ctrl == ctrl && self.shift == shift
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        use ToolbarAction::*;
        vec![
            Shortcut::new("V", false, false, SelectTool),
            Shortcut::new("P", false, false, Draw),
            Shortcut::new("E", false, false, Erase),
            Shortcut::new("R", false, false, InsertRectangle),
            Shortcut::new("O", false, false, InsertEllipse),
            Shortcut::new("T", false, false, Text),
            Shortcut::new("Z", true, false, Undo),
            Shortcut::new("Z", true, true, Redo),
            Shortcut::new("Y", true, false, Redo),
            Shortcut::new("A", true, false, SelectAll),
            Shortcut::new("Escape", false, false, ClearSelection),
            Shortcut::new("Delete", false, false, DeleteSelection),
            Shortcut::new("Backspace", false, false, DeleteSelection),
            Shortcut::new("]", true, false, BringForward),
            Shortcut::new("[", true, false, SendBackward),
            Shortcut::new("]", true, true, BringToFront),
            Shortcut::new("[", true, true, SendToBack),
            Shortcut::new("L", true, false, ToggleLock),
            Shortcut::new("H", true, true, ToggleVisibility),
            Shortcut::new("G", true, false, ToggleSnap),
            Shortcut::new("L", true, true, ToggleLayerPanel),
        ]
    }

    /// Find the action for a combination such as "Ctrl+Shift+Z".
    pub fn lookup(combo: &str) -> Option<ToolbarAction> {
        let mut parts: Vec<&str> = combo.split('+').map(str::trim).collect();
        let key = parts.pop().filter(|k| !k.is_empty())?;
        let mut ctrl = false;
        let mut shift = false;
        for modifier in parts {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "cmd" => ctrl = true,
                "shift" => shift = true,
                _ => return None,
            }
        }
        Self::all()
            .into_iter()
            .find(|s| s.matches(key, ctrl, shift))
            .map(|s| s.action)
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.action.label());
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(ShortcutRegistry::lookup("Ctrl+Z"), Some(ToolbarAction::Undo));
        assert_eq!(ShortcutRegistry::lookup("ctrl+shift+z"), Some(ToolbarAction::Redo));
        assert_eq!(ShortcutRegistry::lookup("Ctrl+Shift+]"), Some(ToolbarAction::BringToFront));
        assert_eq!(ShortcutRegistry::lookup("r"), Some(ToolbarAction::InsertRectangle));
        assert_eq!(ShortcutRegistry::lookup("Alt+Z"), None);
        assert_eq!(ShortcutRegistry::lookup("Ctrl+"), None);
    }

    #[test]
    fn test_no_duplicate_bindings() {
        let all = ShortcutRegistry::all();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.format(), b.format(), "{} bound twice", a.format());
            }
        }
    }
}
