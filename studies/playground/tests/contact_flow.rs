//! Contact form submission against a stand-in transport.

use std::cell::{ Cell, RefCell };

use playground::contact::{
    ContactChannel,
    ContactError,
    ContactForm,
    ContactTransport,
    EmailPayload,
    LogKind,
    SubmitStatus,
};

/// Records every payload and fails while `down` is set.
#[derive(Default)]
struct FakeInbox {
    down: Cell<bool>,
    received: RefCell<Vec<EmailPayload>>,
}

impl ContactTransport for FakeInbox {
    fn send(&self, payload: &EmailPayload) -> Result<(), ContactError> {
        if self.down.get() {
            return Err(ContactError::Transmission("connection refused".into()));
        }
        self.received.borrow_mut().push(payload.clone());
        Ok(())
    }
}

fn filled(channel: &mut ContactChannel<FakeInbox>, email: &str) {
    channel.form = ContactForm::new("Grace", email, "Would love to talk about your projects.");
}

#[test]
fn invalid_email_never_reaches_the_transport() {
    let mut channel = ContactChannel::new(FakeInbox::default());
    filled(&mut channel, "grace@navy");

    let err = channel.submit().unwrap_err();
    assert!(matches!(err, ContactError::Validation(_)));
    assert_eq!(channel.errors().email, Some("Invalid email format"));
    assert_eq!(channel.status(), SubmitStatus::Idle);
    assert!(channel.log().is_empty());
    assert!(channel.transport().received.borrow().is_empty());
}

#[test]
fn failed_send_keeps_the_form_for_retry() {
    let mut channel = ContactChannel::new(FakeInbox::default());
    channel.transport().down.set(true);
    filled(&mut channel, "grace@navy.mil");

    assert!(matches!(channel.submit(), Err(ContactError::Transmission(_))));
    assert_eq!(channel.status(), SubmitStatus::Error);
    assert_eq!(channel.form.email, "grace@navy.mil");
    let last = channel.log().last().unwrap();
    assert_eq!(last.kind, LogKind::Error);
    assert!(last.text.contains("connection refused"));

    // the same form goes through once the inbox is back
    channel.transport().down.set(false);
    channel.submit().unwrap();
    assert_eq!(channel.status(), SubmitStatus::Success);
    assert_eq!(channel.transport().received.borrow().len(), 1);
}

#[test]
fn successful_send_clears_the_form() {
    let mut channel = ContactChannel::new(FakeInbox::default());
    filled(&mut channel, "grace@navy.mil");
    channel.submit().unwrap();

    assert_eq!(channel.form, ContactForm::default());
    assert!(channel.errors().is_empty());
    assert_eq!(channel.log().last().map(|line| line.kind), Some(LogKind::Success));

    let received = channel.transport().received.borrow();
    assert_eq!(received[0].from_name, "Grace");
    assert_eq!(received[0].reply_to, "grace@navy.mil");
}
