use colorful::{Color, Colorful};

/// Sink for transient user-facing notices.
pub trait Notifier {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Prints notices to the terminal.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        println!("{}", message.color(Color::Green));
    }

    fn error(&self, message: &str) {
        eprintln!("{}", message.color(Color::Red).bold());
    }
}
