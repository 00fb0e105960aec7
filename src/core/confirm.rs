use std::cell::RefCell;
use std::rc::Rc;

/// Interactive confirmation step (the browser's `confirm()` dialog).
///
/// Destructive operations (`clear` with confirmation, closing a dirty tab)
/// ask through this capability; hosts inject a real prompt, tests inject a
/// fixed answer.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Answers every prompt with the same value.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Default for AutoConfirm {
    fn default() -> Self {
        AutoConfirm(true)
    }
}

impl Confirm for AutoConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        tracing::debug!(prompt, answer = self.0, "auto confirm");
        self.0
    }
}

/// One confirmation capability installed in several components.
#[derive(Clone)]
pub struct SharedConfirm(Rc<RefCell<Box<dyn Confirm>>>);

impl SharedConfirm {
    pub fn new(confirm: Box<dyn Confirm>) -> Self {
        SharedConfirm(Rc::new(RefCell::new(confirm)))
    }
}

impl Confirm for SharedConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        match self.0.try_borrow_mut() {
            Ok(mut inner) => inner.confirm(prompt),
            Err(_) => {
                tracing::warn!(prompt, "nested confirmation refused");
                false
            }
        }
    }
}
