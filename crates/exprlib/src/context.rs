//! Ambient state handed to functions at call time.

use std::{
    env,
    path::{Path, PathBuf},
};

/// Window a widget is bound to, as reported by the window tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowInfo {
    /// Application id.
    pub appid: String,
    /// Window title.
    pub title: String,
    /// Window is minimized.
    pub minimized: bool,
    /// Window is maximized.
    pub maximized: bool,
    /// Window is fullscreen.
    pub fullscreen: bool,
    /// Window has input focus.
    pub focused: bool,
}

/// Widths of the frame around a widget's content box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Insets {
    /// Left edge.
    pub left: f64,
    /// Right edge.
    pub right: f64,
    /// Top edge.
    pub top: f64,
    /// Bottom edge.
    pub bottom: f64,
}

/// Allocated size of a widget plus its margin, border and padding combined.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geometry {
    /// Allocated width.
    pub width: f64,
    /// Allocated height.
    pub height: f64,
    /// Combined frame.
    pub insets: Insets,
}

impl Geometry {
    /// Width of the content box.
    pub fn content_width(&self) -> f64 {
        self.width - self.insets.left - self.insets.right
    }

    /// Height of the content box.
    pub fn content_height(&self) -> f64 {
        self.height - self.insets.top - self.insets.bottom
    }
}

/// Direction in which a widget's value grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Right to left.
    Left,
    /// Left to right.
    #[default]
    Right,
    /// Bottom to top.
    Top,
    /// Top to bottom.
    Bottom,
}

impl Direction {
    /// Left or right.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Left or top: the fraction is measured from the far edge.
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }
}

/// Pointer position in widget coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerEvent {
    /// Horizontal offset from the widget's left edge.
    pub x: f64,
    /// Vertical offset from the widget's top edge.
    pub y: f64,
}

/// The widget an expression is evaluated for.
pub trait Widget {
    /// Configured id, if any.
    fn id(&self) -> Option<&str> {
        None
    }

    /// Window the widget represents, if any.
    fn window(&self) -> Option<&WindowInfo> {
        None
    }

    /// Current allocation, if the widget is realized.
    fn geometry(&self) -> Option<Geometry> {
        None
    }

    /// Growth direction for `gtkevent("dir")`.
    fn direction(&self) -> Direction {
        Direction::Right
    }
}

/// Services the surrounding application provides to functions.
pub trait Host {
    /// Title of the active window, if known.
    fn active_window(&self) -> Option<String> {
        None
    }

    /// Resolve a user-supplied file name against the configuration search path.
    fn resolve_file(&self, name: &str) -> Option<PathBuf>;
}

/// Everything a function may consult while running.
#[derive(Clone, Copy)]
pub struct CallContext<'a> {
    /// Widget being evaluated for.
    pub widget: Option<&'a dyn Widget>,
    /// Pointer event that triggered the evaluation.
    pub event: Option<&'a PointerEvent>,
    /// Application services.
    pub host: &'a dyn Host,
}

impl<'a> CallContext<'a> {
    /// A context with no widget and no event.
    pub fn new(host: &'a dyn Host) -> Self {
        Self {
            widget: None,
            event: None,
            host,
        }
    }

    /// Attach a widget.
    pub fn with_widget(mut self, widget: &'a dyn Widget) -> Self {
        self.widget = Some(widget);
        self
    }

    /// Attach a pointer event.
    pub fn with_event(mut self, event: &'a PointerEvent) -> Self {
        self.event = Some(event);
        self
    }
}

/// Directories searched for files named in expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Search order.
    dirs: Vec<PathBuf>,
}

impl ConfigPaths {
    /// Explicit search list.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Standard search list: the loaded file's directory, the per-user
    /// configuration directory, then the working directory.
    pub fn standard(config_dir: Option<&Path>) -> Self {
        let mut dirs = Vec::new();
        if let Some(dir) = config_dir {
            dirs.push(dir.to_path_buf());
        }
        if let Some(home) = config::config_home() {
            dirs.push(home);
        }
        if let Ok(cwd) = env::current_dir() {
            dirs.push(cwd);
        }
        Self { dirs }
    }

    /// Directories in search order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// First existing match for `name`. Absolute names are only checked for existence.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.is_absolute() {
            return path.exists().then(|| path.to_path_buf());
        }
        self.dirs
            .iter()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.exists())
    }
}

/// [`Host`] backed by a [`ConfigPaths`] search list and an optional active window title.
#[derive(Debug, Clone, Default)]
pub struct BasicHost {
    /// File search list.
    pub paths: ConfigPaths,
    /// Title returned by `ActiveWin()`.
    pub active_window: Option<String>,
}

impl BasicHost {
    /// Host resolving files through `paths`.
    pub fn new(paths: ConfigPaths) -> Self {
        Self {
            paths,
            active_window: None,
        }
    }
}

impl Host for BasicHost {
    fn active_window(&self) -> Option<String> {
        self.active_window.clone()
    }

    fn resolve_file(&self, name: &str) -> Option<PathBuf> {
        self.paths.resolve(name)
    }
}
