//! The order state machine.
//!
//! Pure transition logic, no side effects. The status flow is
//!
//! `pending` → `pending_payment` → `paid`/`in_preparation` → `ready` → `completed`
//!
//! with `cancelled` reachable from any non-terminal state. Staff-assisted orders may start
//! directly in `in_preparation` with payment still pending. `completed` and `cancelled` are
//! terminal; once reached no further mutation of any kind is permitted.
//!
//! `ready` cannot be reverted to `in_preparation`. A kitchen mistake on a ready order is
//! handled by cancelling and re-creating the order.

use crate::db_types::OrderStatusType;

impl OrderStatusType {
    /// Terminal states admit no transitions and no financial mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Completed | OrderStatusType::Cancelled)
    }

    /// Whether the machine permits moving from `self` to `next`. A status never transitions
    /// to itself.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        if *self == next {
            return false;
        }
        match (*self, next) {
            (s, Cancelled) => !s.is_terminal(),
            (Pending, PendingPayment | InPreparation) => true,
            // Only the confirmation coordinator takes these two edges.
            (PendingPayment, Paid | InPreparation) => true,
            (Paid | InPreparation, Ready) => true,
            (Ready, Completed) => true,
            (_, _) => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::OrderStatusType::{self, *};

    const ALL: [OrderStatusType; 7] = [Pending, PendingPayment, Paid, InPreparation, Ready, Completed, Cancelled];

    #[test]
    fn happy_path() {
        assert!(Pending.can_transition_to(PendingPayment));
        assert!(PendingPayment.can_transition_to(Paid));
        assert!(PendingPayment.can_transition_to(InPreparation));
        assert!(Paid.can_transition_to(Ready));
        assert!(InPreparation.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Completed));
    }

    #[test]
    fn staff_assisted_orders_skip_the_payment_gate() {
        assert!(Pending.can_transition_to(InPreparation));
    }

    #[test]
    fn cancellation_from_any_non_terminal_state() {
        for s in ALL {
            assert_eq!(s.can_transition_to(Cancelled), !s.is_terminal(), "from {s}");
        }
    }

    #[test]
    fn terminal_states_are_final() {
        for from in [Completed, Cancelled] {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn ready_cannot_revert_to_preparation() {
        assert!(!Ready.can_transition_to(InPreparation));
        assert!(!Ready.can_transition_to(Paid));
        assert!(!Ready.can_transition_to(PendingPayment));
    }

    #[test]
    fn no_self_transitions() {
        for s in ALL {
            assert!(!s.can_transition_to(s), "{s} -> {s} must be rejected");
        }
    }

    #[test]
    fn completion_requires_ready() {
        for from in [Pending, PendingPayment, Paid, InPreparation] {
            assert!(!from.can_transition_to(Completed), "{from} -> completed must be rejected");
        }
    }
}
