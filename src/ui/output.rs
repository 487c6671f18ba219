use crate::ui::{theme, Icons, Role};
use owo_colors::OwoColorize;

pub fn header(icon: &str, text: &str) {
    println!("{} {}", icon, text.style(theme().style(Role::Heading)));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().style(Role::Stored)));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().style(Role::Failure)));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().style(Role::Caution)));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().style(Role::Marker)),
        label.style(theme().style(Role::Muted)),
        value.style(theme().style(Role::Label))
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().style(Role::Heading)));
}

pub fn dim(text: &str) -> String {
    text.style(theme().style(Role::Muted)).to_string()
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().style(Role::Muted)), value);
}
