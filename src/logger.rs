// Colored, aligned log output. Loosely based on pretty_env_logger v0.4.0.

use std::fmt;
use std::io::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};

use env_logger::{
    fmt::{Color, Style, StyledValue},
    Builder, Env,
};
use log::Level;

/// Installs the global logger. `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str) {
    let env = Env::default().filter_or("RUST_LOG", level);

    Builder::from_env(env)
        .format(|buf, record| {
            let module = short_module(record.target());
            let width = module_width(module);

            let mut style = buf.style();
            let level = colored_level(&mut style, record.level());

            let mut style = buf.style();
            let module = style.set_bold(true).value(Padded {
                value: module,
                width,
            });

            let time = buf.timestamp_millis();
            let text = record.args().to_string();
            let mut lines = text.lines();

            writeln!(
                buf,
                "{time} {level} {module} > {}",
                lines.next().unwrap_or_default()
            )?;

            // 24 (timestamp) + 5 (level) + 2 spaces
            for line in lines {
                writeln!(buf, "{:31}{:width$}   {line}", "", "")?;
            }

            Ok(())
        })
        .init();
}

/// Strips the crate name, `gif_splitter::splitter` is logged as `splitter`.
fn short_module(target: &str) -> &str {
    match target.split_once("::") {
        Some((_, module)) => module,
        None => "main",
    }
}

struct Padded<T> {
    value: T,
    width: usize,
}

impl<T: fmt::Display> fmt::Display for Padded<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{: <width$}", self.value, width = self.width)
    }
}

static MAX_MODULE_WIDTH: AtomicUsize = AtomicUsize::new(0);

fn module_width(module: &str) -> usize {
    MAX_MODULE_WIDTH
        .fetch_max(module.len(), Ordering::Relaxed)
        .max(module.len())
}

fn colored_level(style: &'_ mut Style, level: Level) -> StyledValue<'_, &'static str> {
    match level {
        Level::Trace => style.set_color(Color::Magenta).value("TRACE"),
        Level::Debug => style.set_color(Color::Blue).value("DEBUG"),
        Level::Info => style.set_color(Color::Green).value("INFO "),
        Level::Warn => style.set_color(Color::Yellow).value("WARN "),
        Level::Error => style.set_color(Color::Red).value("ERROR"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_module() {
        assert_eq!(short_module("gif_splitter::splitter"), "splitter");
        assert_eq!(short_module("gif_splitter::commands::split"), "commands::split");
        assert_eq!(short_module("gif_splitter"), "main");
    }
}
