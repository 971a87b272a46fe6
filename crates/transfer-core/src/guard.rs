use crate::error::TransferError;

/// Native coin leaving the sender: the value carried plus the fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spend {
    pub value: u128,
    pub fee: u128,
    pub balance: u128,
}

/// Token units leaving the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpend {
    pub amount: u128,
    pub balance: u128,
}

/// Rejects a spend whose `value + fee` exceeds the observed balance.
///
/// A sum past `u128::MAX` can never be covered and is reported as `required: u128::MAX`.
pub fn check(spend: Spend) -> Result<(), TransferError> {
    let Some(required) = spend.value.checked_add(spend.fee) else {
        return Err(TransferError::InsufficientBalance {
            required: u128::MAX,
            available: spend.balance,
        });
    };
    if required > spend.balance {
        return Err(TransferError::InsufficientBalance {
            required,
            available: spend.balance,
        });
    }
    Ok(())
}

pub fn check_token(spend: TokenSpend) -> Result<(), TransferError> {
    if spend.amount > spend.balance {
        return Err(TransferError::InsufficientBalance {
            required: spend.amount,
            available: spend.balance,
        });
    }
    Ok(())
}
