use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReviewRejection {
    #[error("You can only review housing you have booked.")]
    NeverBooked,
    #[error("You have already reviewed this housing.")]
    AlreadyReviewed,
}

/// A user may review a housing once, and only after booking it.
pub fn check_review_eligibility(has_booking: bool, has_review: bool) -> Result<(), ReviewRejection> {
    if !has_booking {
        return Err(ReviewRejection::NeverBooked);
    }
    if has_review {
        return Err(ReviewRejection::AlreadyReviewed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligibility_reasons_are_distinct() {
        assert_eq!(check_review_eligibility(false, false), Err(ReviewRejection::NeverBooked));
        assert_eq!(check_review_eligibility(true, true), Err(ReviewRejection::AlreadyReviewed));
        assert_eq!(check_review_eligibility(true, false), Ok(()));
    }

    #[test]
    fn never_booked_wins_over_duplicate() {
        assert_eq!(check_review_eligibility(false, true), Err(ReviewRejection::NeverBooked));
    }
}
