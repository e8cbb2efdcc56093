//! Utilities for valid-ready channels.

use std::marker::PhantomData;

use crate::*;

/// Valid/ready channel's forward signals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Signal)]
pub struct Valid<V: Signal> {
    /// Inner data
    pub inner: V,

    /// Valid bit
    pub valid: bool,
}

impl<V: Signal> Valid<V> {
    /// Creates a new value.
    pub fn new(valid: bool, inner: V) -> Self { Self { inner, valid } }

    /// Creates a valid value.
    pub fn valid(inner: V) -> Self { Self::new(true, inner) }

    /// Returns the inner value if valid.
    pub fn into_option(self) -> Option<V> { self.valid.then_some(self.inner) }

    /// Returns a reference to the inner value if valid.
    pub fn as_option(&self) -> Option<&V> { self.valid.then_some(&self.inner) }

    /// Maps the inner value.
    pub fn map_inner<W: Signal, F: FnOnce(V) -> W>(self, f: F) -> Valid<W> { Valid::new(self.valid, f(self.inner)) }

    /// Zips the inner value with other value.
    pub fn zip_inner<W: Signal>(self, other: W) -> Valid<(V, W)> { Valid::new(self.valid, (self.inner, other)) }
}

impl<V: Signal + Default> Valid<V> {
    /// Creates an invalid value.
    pub fn invalid() -> Self { Self::new(false, V::default()) }
}

impl<V: Signal + Default> From<Option<V>> for Valid<V> {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(inner) => Self::valid(inner),
            None => Self::invalid(),
        }
    }
}

/// Ready signal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Signal)]
pub struct Ready {
    /// Ready bit
    pub ready: bool,
}

impl Ready {
    /// Creates a new value.
    pub fn new(ready: bool) -> Self { Self { ready } }
}

/// Both halves of a valid-ready channel during one cycle.
///
/// A transfer happens exactly when `fwd.valid` and `bwd.ready` are both high. The producer must
/// hold `fwd` stable until the transfer; the consumer must not withdraw `bwd.ready` on the same
/// cycle it offered it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VrChannel<V: Signal> {
    /// Producer side.
    pub fwd: Valid<V>,
    /// Consumer side.
    pub bwd: Ready,
}

impl<V: Signal> VrChannel<V> {
    /// Creates a new channel.
    pub fn new(fwd: Valid<V>, bwd: Ready) -> Self { Self { fwd, bwd } }

    /// Returns fire signal. (fire signal: valid & ready)
    pub fn fire(&self) -> bool { self.fwd.valid && self.bwd.ready }

    /// Returns the transferred value, if any.
    pub fn transfer(&self) -> Option<&V> { self.fire().then_some(&self.fwd.inner) }
}

/// Joins two channels into one channel of pairs.
///
/// The output is valid only if both inputs are valid. An input is ready only if the output is
/// ready and the other input is valid, so the two inputs always transfer on the same cycle.
#[derive(Debug)]
pub struct Join<A, B> {
    _marker: PhantomData<(A, B)>,
}

impl<A, B> Default for Join<A, B> {
    fn default() -> Self { Self { _marker: PhantomData } }
}

impl<A: Signal + PartialEq, B: Signal + PartialEq> Logic for Join<A, B> {
    type EgressBwd = Ready;
    type EgressFwd = Valid<(A, B)>;
    type IngressBwd = (Ready, Ready);
    type IngressFwd = (Valid<A>, Valid<B>);
    type State = ();

    fn init(&self) {}

    fn logic(&self, i_fwd: &(Valid<A>, Valid<B>), o_bwd: &Ready, s: &()) -> (Valid<(A, B)>, (Ready, Ready), ()) {
        let (a, b) = i_fwd;

        let o_fwd = Valid::new(a.valid && b.valid, (a.inner.clone(), b.inner.clone()));
        let i_bwd = (Ready::new(o_bwd.ready && b.valid), Ready::new(o_bwd.ready && a.valid));

        (o_fwd, i_bwd, *s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_fires_on_valid_and_ready() {
        let channel = VrChannel::new(Valid::valid(3u8), Ready::new(false));
        assert!(!channel.fire());
        assert_eq!(channel.transfer(), None);

        let channel = VrChannel::new(Valid::valid(3u8), Ready::new(true));
        assert_eq!(channel.transfer(), Some(&3));

        let channel = VrChannel::new(Valid::<u8>::invalid(), Ready::new(true));
        assert!(!channel.fire());
    }

    #[test]
    fn valid_is_a_signal() {
        assert_eq!(<Valid<u32>>::WIDTH, 33);
        let value = Valid::valid(-7i16);
        assert_eq!(Valid::<i16>::from_bits(&value.transl()), value);
    }

    #[test]
    fn join_transfers_both_sides_together() {
        let join = Join::<u8, u16>::default();

        let (o_fwd, (ready_a, ready_b), _) = join.logic(&(Valid::valid(1), Valid::invalid()), &Ready::new(true), &());
        assert!(!o_fwd.valid);
        assert!(!ready_a.ready);
        assert!(ready_b.ready);

        let (o_fwd, (ready_a, ready_b), _) = join.logic(&(Valid::valid(1), Valid::valid(2)), &Ready::new(true), &());
        assert_eq!(o_fwd.into_option(), Some((1, 2)));
        assert!(ready_a.ready && ready_b.ready);

        let (_, (ready_a, ready_b), _) = join.logic(&(Valid::valid(1), Valid::valid(2)), &Ready::new(false), &());
        assert!(!ready_a.ready && !ready_b.ready);
    }
}
