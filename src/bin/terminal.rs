use crossbeam_channel::{select, unbounded, Receiver};
use geopost::*;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Prints notifications to the terminal.
pub struct TerminalNotifier {
    behavior: NotificationBehavior,
    unread: AtomicUsize,
}

impl TerminalNotifier {
    pub fn new(behavior: NotificationBehavior) -> Self {
        Self {
            behavior,
            unread: AtomicUsize::new(0),
        }
    }

    /// Number shown on the badge, zero when badges are off.
    pub fn badge(&self) -> usize {
        if self.behavior.set_badge {
            self.unread.load(Ordering::SeqCst)
        } else {
            0
        }
    }

    /// Format a notification the way it is printed.
    pub fn line(&self, notification: &Notification) -> String {
        let unread = self.unread.fetch_add(1, Ordering::SeqCst) + 1;
        let bell = if self.behavior.play_sound { "\x07" } else { "" };
        if self.behavior.set_badge {
            format!("{}[notification ({})] {}", bell, unread, notification)
        } else {
            format!("{}[notification] {}", bell, notification)
        }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) {
        log::debug!("Notification {} ({:?})", notification, self.behavior);
        let line = self.line(notification);
        if self.behavior.show_alert {
            println!("{}", line);
        }
    }
}

pub struct TerminalAlerter;

impl Alerter for TerminalAlerter {
    fn alert(&self, alert: &Alert) {
        match alert.kind {
            AlertKind::Blocking => println!("[alert] {} (restart after granting access)", alert.message),
            AlertKind::NonBlocking => println!("[alert] {}", alert.message),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Url(String),
    Send,
    Show,
    Quit,
    Help,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (word, rest) = match line.find(char::is_whitespace) {
            Some(i) => (&line[..i], line[i..].trim()),
            None => (line, ""),
        };
        match word {
            "url" => Some(Command::Url(rest.to_string())),
            "send" => Some(Command::Send),
            "show" | "" => Some(Command::Show),
            "quit" | "exit" => Some(Command::Quit),
            "help" => Some(Command::Help),
            _ => None,
        }
    }
}

fn print_screen(screen: &Screen) {
    println!();
    for line in screen.render() {
        println!("  {}", line);
    }
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_help() {
    println!("Commands: url <text>, send, show, quit");
}

/// Forward stdin lines over a channel. The channel closes at end of input.
fn spawn_input() -> Receiver<String> {
    let (tx, rx) = unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Could not read from stdin. Reason:\r\n{}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Apply one input line. Returns `false` when the user wants to leave.
fn handle(tracker: &Tracker, line: &str) -> bool {
    match Command::parse(line) {
        Some(Command::Url(url)) => tracker.screen().set_url(url),
        Some(Command::Send) => match tracker.confirm_and_send() {
            Ok(outcome) => log::debug!("Confirm and send finished with {:?}.", outcome),
            Err(e) => log::error!("Could not read the current position. Reason:\r\n{}", e),
        },
        Some(Command::Show) => {}
        Some(Command::Quit) => return false,
        Some(Command::Help) | None => print_help(),
    }
    true
}

/// Drive the screen from stdin until `quit` or end of input.
///
/// The form is also redrawn whenever the background task moves the coordinates.
pub fn run(tracker: &Tracker) {
    let changes = tracker.screen().watch();
    let input = spawn_input();

    print_help();
    print_screen(tracker.screen());

    loop {
        select! {
            recv(input) -> line => match line {
                Ok(line) => {
                    if !handle(tracker, &line) {
                        break;
                    }
                    // The redraw below already shows writes made by the command.
                    changes.try_iter().for_each(drop);
                    print_screen(tracker.screen());
                }
                Err(_) => break,
            },
            recv(changes) -> revision => {
                if let Ok(revision) = revision {
                    log::trace!("Redrawing for revision {}.", revision);
                }
                print_screen(tracker.screen());
            },
        }
    }
}

#[test]
fn test_parse_commands() {
    assert_eq!(
        Command::parse("url  http://localhost:8080/loc "),
        Some(Command::Url("http://localhost:8080/loc".to_string()))
    );
    assert_eq!(Command::parse("url"), Some(Command::Url(String::new())));
    assert_eq!(Command::parse("send"), Some(Command::Send));
    assert_eq!(Command::parse(""), Some(Command::Show));
    assert_eq!(Command::parse("exit"), Some(Command::Quit));
    assert_eq!(Command::parse("jump"), None);
}

#[test]
fn test_badge_counts_notifications() {
    let behavior = NotificationBehavior {
        show_alert: false,
        play_sound: false,
        set_badge: true,
    };
    let notifier = TerminalNotifier::new(behavior);
    notifier.notify(&Notification::new("Success", "Location was sent to the server"));
    notifier.notify(&Notification::new("Server delivery failed", "Check the URL"));
    assert_eq!(notifier.badge(), 2);
    assert_eq!(
        notifier.line(&Notification::new("URL not entered", "x")),
        "[notification (3)] URL not entered: x"
    );

    let plain = TerminalNotifier::new(NotificationBehavior::default());
    plain.notify(&Notification::new("Success", "x"));
    assert_eq!(plain.badge(), 0);
}
