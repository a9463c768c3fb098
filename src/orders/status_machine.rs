use crate::auth::Actor;
use crate::orders::{OrderError, OrderStatus};

/// Order status transitions and who may request them
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - PENDING → APPROVE, CANCELLED
    /// - APPROVE → PAID, CANCELLED
    /// - PAID → DELIVERING
    /// - DELIVERING → DONE
    /// - CANCELLED and DONE are final
    pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        matches!(
            (from, to),
            (OrderStatus::Pending, OrderStatus::Approve)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Approve, OrderStatus::Paid)
                | (OrderStatus::Approve, OrderStatus::Cancelled)
                | (OrderStatus::Paid, OrderStatus::Delivering)
                | (OrderStatus::Delivering, OrderStatus::Done)
        )
    }

    /// `Ok(to)` if the transition is valid
    pub fn transition(from: OrderStatus, to: OrderStatus) -> Result<OrderStatus, OrderError> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(OrderError::InvalidTransition { from, to })
        }
    }

    /// Role rules on top of the transition table.
    ///
    /// `owns_order` is whether a customer placed the order; visibility for
    /// dealers is checked when the order is loaded.
    pub fn authorize(
        actor: Actor,
        owns_order: bool,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), OrderError> {
        match actor {
            Actor::Admin => Ok(()),
            Actor::Dealer(_) => match to {
                OrderStatus::Approve
                | OrderStatus::Cancelled
                | OrderStatus::Paid
                | OrderStatus::Delivering => Ok(()),
                _ => Err(OrderError::Forbidden(format!(
                    "Dealers cannot set orders to {}.",
                    to
                ))),
            },
            Actor::Customer(_) => {
                if !owns_order {
                    return Err(OrderError::Forbidden(
                        "You can only update your own orders.".to_string(),
                    ));
                }
                if to != OrderStatus::Done {
                    return Err(OrderError::Forbidden(
                        "Customers can only confirm delivery of their orders.".to_string(),
                    ));
                }
                if from != OrderStatus::Delivering {
                    return Err(OrderError::NotDelivering);
                }
                Ok(())
            }
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn order_status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::ALL.to_vec())
    }

    /// Every edge of the lifecycle is accepted
    #[test]
    fn prop_valid_transitions_are_allowed() {
        let valid_transitions = vec![
            (OrderStatus::Pending, OrderStatus::Approve),
            (OrderStatus::Pending, OrderStatus::Cancelled),
            (OrderStatus::Approve, OrderStatus::Paid),
            (OrderStatus::Approve, OrderStatus::Cancelled),
            (OrderStatus::Paid, OrderStatus::Delivering),
            (OrderStatus::Delivering, OrderStatus::Done),
        ];

        for (from, to) in valid_transitions {
            assert!(
                StatusMachine::is_valid_transition(from, to),
                "Valid transition from {} to {} should be allowed",
                from,
                to
            );
            assert_eq!(StatusMachine::transition(from, to).unwrap(), to);
        }
    }

    proptest! {
        #[test]
        fn prop_final_states_are_terminal(to in order_status_strategy()) {
            prop_assert!(!StatusMachine::is_valid_transition(OrderStatus::Cancelled, to));
            prop_assert!(!StatusMachine::is_valid_transition(OrderStatus::Done, to));
        }

        #[test]
        fn prop_nothing_returns_to_pending(from in order_status_strategy()) {
            prop_assert!(!StatusMachine::is_valid_transition(from, OrderStatus::Pending));
        }

        #[test]
        fn prop_transition_consistency(
            from in order_status_strategy(),
            to in order_status_strategy()
        ) {
            let is_valid = StatusMachine::is_valid_transition(from, to);
            prop_assert_eq!(StatusMachine::transition(from, to).is_ok(), is_valid);
        }

        /// Admins are only limited by the transition table
        #[test]
        fn prop_admin_always_authorized(
            from in order_status_strategy(),
            to in order_status_strategy()
        ) {
            prop_assert!(StatusMachine::authorize(Actor::Admin, false, from, to).is_ok());
        }
    }
}
