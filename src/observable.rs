use std::fmt;

pub type SubscriptionId = usize;

type Subscriber<T> = Box<dyn FnMut(&T)>;

/// Mutable value that tells its subscribers about every change made
/// through [`Observable::update`] or [`Observable::replace`].
pub struct Observable<T> {
    value: T,
    next_id: SubscriptionId,
    subscribers: Vec<(SubscriptionId, Subscriber<T>)>,
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        Observable {
            value,
            next_id: 0,
            subscribers: vec![],
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn subscribe<F: FnMut(&T) + 'static>(&mut self, subscriber: F) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(i, _)| *i != id);
        self.subscribers.len() != before
    }

    pub fn update<R, F: FnOnce(&mut T) -> R>(&mut self, f: F) -> R {
        let result = f(&mut self.value);
        self.notify();
        result
    }

    pub fn replace(&mut self, value: T) -> T {
        let old = std::mem::replace(&mut self.value, value);
        self.notify();
        old
    }

    fn notify(&mut self) {
        let value = &self.value;
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
