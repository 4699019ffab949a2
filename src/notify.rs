//! User-feedback sink. The report controller never prints directly; it
//! reports through this trait so the terminal front-end and the tests can
//! each observe the same success/warn/error stream.

pub trait Notify {
    fn success(&self, summary: &str, detail: &str);
    fn warn(&self, summary: &str, detail: &str);
    fn error(&self, summary: &str, detail: &str);
}

/// Terminal implementation: successes to stdout, problems to stderr.
pub struct TermNotify;

impl Notify for TermNotify {
    fn success(&self, summary: &str, detail: &str) {
        println!("{summary}: {detail}");
    }

    fn warn(&self, summary: &str, detail: &str) {
        eprintln!("warning: {summary}: {detail}");
    }

    fn error(&self, summary: &str, detail: &str) {
        eprintln!("error: {summary}: {detail}");
    }
}
