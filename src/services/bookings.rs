use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use thiserror::Error;

use crate::models::{Booking, BookingStatus, Housing, TransitionError, User};
use crate::policy::{check_availability, is_owner_or_admin, BookingRequest, DateRange, Rejection};

#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("This booking can no longer be changed.")]
    Closed,
    #[error("not allowed")]
    Forbidden,
    #[error("booking not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A booking together with what the pages need to show and authorize it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookingDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: Booking,
    pub housing_name: String,
    pub housing_owner_id: String,
    pub guest_name: String,
}

const SELECT_DETAIL: &str = r#"
    SELECT b.*, h.name AS housing_name, h.owner_id AS housing_owner_id,
        u.username AS guest_name
    FROM bookings b
    JOIN housings h ON h.id = b.housing_id
    JOIN users u ON u.id = b.owner_id
"#;

/// Ranges of the pending and confirmed bookings of a housing.
async fn active_ranges(
    conn: &mut SqliteConnection,
    housing_id: &str,
    exclude_booking: Option<&str>,
) -> Result<Vec<DateRange>, sqlx::Error> {
    let rows: Vec<(NaiveDate, NaiveDate)> = sqlx::query_as(
        r#"
        SELECT date_from, date_to FROM bookings
        WHERE housing_id = ? AND status IN ('PENDING', 'CONFIRMED') AND id != ?
        "#,
    )
    .bind(housing_id)
    .bind(exclude_booking.unwrap_or(""))
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(from, to)| DateRange::new(from, to))
        .collect())
}

/// Active bookings of a housing that have not ended yet, earliest first.
pub async fn upcoming_ranges(
    db: &SqlitePool,
    housing_id: &str,
) -> Result<Vec<DateRange>, sqlx::Error> {
    let rows: Vec<(NaiveDate, NaiveDate)> = sqlx::query_as(
        r#"
        SELECT date_from, date_to FROM bookings
        WHERE housing_id = ? AND status IN ('PENDING', 'CONFIRMED') AND date_to >= ?
        ORDER BY date_from
        "#,
    )
    .bind(housing_id)
    .bind(super::today())
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(from, to)| DateRange::new(from, to))
        .collect())
}

/// Run the availability rules and store an unconfirmed booking.
pub async fn place(
    db: &SqlitePool,
    user: &User,
    housing: &Housing,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
) -> Result<Booking, BookingError> {
    let mut tx = db.begin().await?;

    let active = active_ranges(&mut tx, &housing.id, None).await?;
    let request = BookingRequest {
        requester_id: &user.id,
        date_from,
        date_to,
    };
    let range = check_availability(&request, &housing.owner_id, super::today(), &active)
        .inspect_err(|reason| {
            tracing::info!(housing_id = %housing.id, user_id = %user.id, %reason, "booking rejected");
        })?;

    let booking = Booking::new(user.id.clone(), housing.id.clone(), range);
    sqlx::query(
        r#"
        INSERT INTO bookings (id, owner_id, housing_id, status, date_from, date_to, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&booking.id)
    .bind(&booking.owner_id)
    .bind(&booking.housing_id)
    .bind(booking.status)
    .bind(booking.date_from)
    .bind(booking.date_to)
    .bind(&booking.created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        booking_id = %booking.id,
        housing_id = %booking.housing_id,
        from = %booking.date_from,
        to = %booking.date_to,
        "booking placed"
    );
    Ok(booking)
}

pub async fn find_detail(db: &SqlitePool, id: &str) -> Result<Option<BookingDetail>, sqlx::Error> {
    let sql = format!("{SELECT_DETAIL} WHERE b.id = ?");
    sqlx::query_as(&sql).bind(id).fetch_optional(db).await
}

async fn find_detail_in(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<BookingDetail>, sqlx::Error> {
    let sql = format!("{SELECT_DETAIL} WHERE b.id = ?");
    sqlx::query_as(&sql).bind(id).fetch_optional(&mut *conn).await
}

/// Bookings the user made, plus bookings on housings the user owns.
/// Staff see every booking.
pub async fn visible_to(db: &SqlitePool, user: &User) -> Result<Vec<BookingDetail>, sqlx::Error> {
    if user.is_staff {
        let sql = format!("{SELECT_DETAIL} ORDER BY b.date_from DESC, b.created_at DESC");
        return sqlx::query_as(&sql).fetch_all(db).await;
    }

    let sql = format!(
        "{SELECT_DETAIL} WHERE b.owner_id = ? OR h.owner_id = ? ORDER BY b.date_from DESC, b.created_at DESC"
    );
    sqlx::query_as(&sql)
        .bind(&user.id)
        .bind(&user.id)
        .fetch_all(db)
        .await
}

/// Who may look at a booking: its guest, the housing owner, staff.
pub fn can_view(user: &User, detail: &BookingDetail) -> bool {
    is_owner_or_admin(user, &detail.booking.owner_id) || user.id == detail.housing_owner_id
}

/// Move a booking to new dates. Only its guest (or staff) may, and only
/// while the booking is still open.
pub async fn reschedule(
    db: &SqlitePool,
    user: &User,
    booking_id: &str,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
) -> Result<Booking, BookingError> {
    let mut tx = db.begin().await?;
    let booking = reschedule_in(&mut tx, user, booking_id, date_from, date_to).await?;
    tx.commit().await?;

    tracing::info!(%booking_id, from = %booking.date_from, to = %booking.date_to, "booking rescheduled");
    Ok(booking)
}

async fn reschedule_in(
    conn: &mut SqliteConnection,
    user: &User,
    booking_id: &str,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
) -> Result<Booking, BookingError> {
    let detail = find_detail_in(conn, booking_id)
        .await?
        .ok_or(BookingError::NotFound)?;
    if !is_owner_or_admin(user, &detail.booking.owner_id) {
        return Err(BookingError::Forbidden);
    }
    if detail.booking.status.is_terminal() {
        return Err(BookingError::Closed);
    }

    let active = active_ranges(conn, &detail.booking.housing_id, Some(booking_id)).await?;
    let request = BookingRequest {
        requester_id: &detail.booking.owner_id,
        date_from,
        date_to,
    };
    let range = check_availability(&request, &detail.housing_owner_id, super::today(), &active)?;

    sqlx::query("UPDATE bookings SET date_from = ?, date_to = ? WHERE id = ?")
        .bind(range.start())
        .bind(range.end())
        .bind(booking_id)
        .execute(&mut *conn)
        .await?;

    Ok(Booking {
        date_from: range.start(),
        date_to: range.end(),
        ..detail.booking
    })
}

/// Apply a lifecycle transition.
///
/// Cancelling is open to the guest, the housing owner and staff; every
/// other status change belongs to the housing owner and staff. Entering an
/// active status re-checks the dates against the other active bookings, so
/// two active bookings of one housing never overlap.
pub async fn change_status(
    db: &SqlitePool,
    user: &User,
    booking_id: &str,
    to: BookingStatus,
) -> Result<Booking, BookingError> {
    let mut tx = db.begin().await?;
    let (from, booking) = change_status_in(&mut tx, user, booking_id, to).await?;
    tx.commit().await?;

    tracing::info!(%booking_id, %from, to = %booking.status, by = %user.id, "booking status changed");
    Ok(booking)
}

async fn change_status_in(
    conn: &mut SqliteConnection,
    user: &User,
    booking_id: &str,
    to: BookingStatus,
) -> Result<(BookingStatus, Booking), BookingError> {
    let detail = find_detail_in(conn, booking_id)
        .await?
        .ok_or(BookingError::NotFound)?;

    let is_host = is_owner_or_admin(user, &detail.housing_owner_id);
    let allowed = match to {
        BookingStatus::Canceled => is_host || user.id == detail.booking.owner_id,
        _ => is_host,
    };
    if !allowed {
        return Err(BookingError::Forbidden);
    }

    let status = detail.booking.status.transition(to)?;

    if status.is_active() {
        let active = active_ranges(conn, &detail.booking.housing_id, Some(booking_id)).await?;
        if let Some(range) = detail.booking.range() {
            if let Some(taken) = active.iter().find(|taken| taken.overlaps(&range)) {
                return Err(Rejection::Overlap(taken.start(), taken.end()).into());
            }
        }
    }

    sqlx::query("UPDATE bookings SET status = ? WHERE id = ?")
        .bind(status)
        .bind(booking_id)
        .execute(&mut *conn)
        .await?;

    let from = detail.booking.status;
    Ok((
        from,
        Booking {
            status,
            ..detail.booking
        },
    ))
}

/// New dates and/or a new status for one booking, applied together or not
/// at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingChange {
    pub dates: Option<(Option<NaiveDate>, Option<NaiveDate>)>,
    pub status: Option<BookingStatus>,
}

/// Run [`reschedule`] and then [`change_status`] in one transaction. If
/// either step is refused nothing is stored.
pub async fn apply_change(
    db: &SqlitePool,
    user: &User,
    booking_id: &str,
    change: BookingChange,
) -> Result<(), BookingError> {
    let mut tx = db.begin().await?;

    if let Some((date_from, date_to)) = change.dates {
        reschedule_in(&mut tx, user, booking_id, date_from, date_to).await?;
    }
    if let Some(to) = change.status {
        change_status_in(&mut tx, user, booking_id, to).await?;
    }

    tx.commit().await?;
    tracing::info!(%booking_id, by = %user.id, ?change, "booking changed");
    Ok(())
}

pub async fn delete(db: &SqlitePool, booking_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM bookings WHERE id = ?")
        .bind(booking_id)
        .execute(db)
        .await?;
    Ok(())
}
