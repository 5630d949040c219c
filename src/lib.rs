use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use diesel::prelude::*;

pub mod db;
pub mod finance;
pub mod models;
pub mod normalize;
pub mod renewal;
pub mod schema;
pub mod templates;

use self::models::*;
use db::{DbError, PgPool};

/// The business operates on Brazilian wall-clock days; every "today" in the
/// system is anchored here.
pub const LOCAL_TZ: chrono_tz::Tz = chrono_tz::America::Sao_Paulo;

pub fn today_local() -> NaiveDate {
    Utc::now().with_timezone(&LOCAL_TZ).date_naive()
}

pub fn create_client(pool: &PgPool, new_client: NewClient) -> Result<Client, DbError> {
    use self::schema::clients;

    let conn = &mut pool.get()?;

    Ok(diesel::insert_into(clients::table)
        .values(&new_client)
        .get_result(conn)?)
}

pub fn find_client_by_id(
    pool: &PgPool,
    client_id: i32,
    owner: i64,
) -> Result<Option<Client>, DbError> {
    use self::schema::clients::dsl::*;

    let conn = &mut pool.get()?;

    Ok(clients
        .filter(id.eq(client_id))
        .filter(owner_id.eq(owner))
        .first::<Client>(conn)
        .optional()?)
}

pub fn find_clients_by_owner(pool: &PgPool, owner: i64) -> Result<Vec<Client>, DbError> {
    use self::schema::clients::dsl::*;

    let conn = &mut pool.get()?;

    Ok(clients
        .filter(owner_id.eq(owner))
        .order(due_date.asc())
        .load::<Client>(conn)?)
}

/// Owner-scoped lookup by phone fragment; digits-only input matches anywhere
/// in the stored number.
pub fn find_clients_by_phone(
    pool: &PgPool,
    owner: i64,
    digits: &str,
) -> Result<Vec<Client>, DbError> {
    use self::schema::clients::dsl::*;

    let conn = &mut pool.get()?;

    Ok(clients
        .filter(owner_id.eq(owner))
        .filter(phone.like(format!("%{}%", digits)))
        .order(due_date.asc())
        .load::<Client>(conn)?)
}

/// Every client across all owners; only the notification scheduler reads this.
pub fn get_all_clients(pool: &PgPool) -> Result<Vec<Client>, DbError> {
    use self::schema::clients::dsl::*;

    let conn = &mut pool.get()?;

    Ok(clients.order(id.asc()).load::<Client>(conn)?)
}

pub fn update_client(
    pool: &PgPool,
    client_id: i32,
    owner: i64,
    updates: UpdateClient,
) -> Result<Client, DbError> {
    use self::schema::clients::dsl::*;

    let conn = &mut pool.get()?;

    Ok(diesel::update(
        clients
            .filter(id.eq(client_id))
            .filter(owner_id.eq(owner)),
    )
    .set((&updates, updated_at.eq(Utc::now())))
    .get_result(conn)?)
}

pub fn update_client_due_date(
    pool: &PgPool,
    client_id: i32,
    owner: i64,
    new_due_date: NaiveDate,
) -> Result<Client, DbError> {
    use self::schema::clients::dsl::*;

    let conn = &mut pool.get()?;

    Ok(diesel::update(
        clients
            .filter(id.eq(client_id))
            .filter(owner_id.eq(owner)),
    )
    .set((due_date.eq(new_due_date), updated_at.eq(Utc::now())))
    .get_result(conn)?)
}

pub fn mark_client_paid(
    pool: &PgPool,
    client_id: i32,
    owner: i64,
    paid_on: NaiveDate,
) -> Result<Client, DbError> {
    use self::schema::clients::dsl::*;

    let conn = &mut pool.get()?;

    Ok(diesel::update(
        clients
            .filter(id.eq(client_id))
            .filter(owner_id.eq(owner)),
    )
    .set((
        payment_status.eq(PAYMENT_PAID),
        payment_date.eq(Some(paid_on)),
        updated_at.eq(Utc::now()),
    ))
    .get_result(conn)?)
}

pub fn mark_client_pending(pool: &PgPool, client_id: i32, owner: i64) -> Result<Client, DbError> {
    use self::schema::clients::dsl::*;

    let conn = &mut pool.get()?;

    Ok(diesel::update(
        clients
            .filter(id.eq(client_id))
            .filter(owner_id.eq(owner)),
    )
    .set((
        payment_status.eq(PAYMENT_PENDING),
        payment_date.eq(None::<NaiveDate>),
        updated_at.eq(Utc::now()),
    ))
    .get_result(conn)?)
}

pub fn delete_client(pool: &PgPool, client_id: i32, owner: i64) -> Result<bool, DbError> {
    use self::schema::clients::dsl::*;

    let conn = &mut pool.get()?;

    let deleted = diesel::delete(
        clients
            .filter(id.eq(client_id))
            .filter(owner_id.eq(owner)),
    )
    .execute(conn)?;

    Ok(deleted > 0)
}

pub fn count_due_between(
    pool: &PgPool,
    owner: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<i64, DbError> {
    use self::schema::clients::dsl::*;

    let conn = &mut pool.get()?;

    Ok(clients
        .filter(owner_id.eq(owner))
        .filter(due_date.ge(from))
        .filter(due_date.le(to))
        .count()
        .get_result(conn)?)
}

pub fn count_overdue(pool: &PgPool, owner: i64, today: NaiveDate) -> Result<i64, DbError> {
    use self::schema::clients::dsl::*;

    let conn = &mut pool.get()?;

    Ok(clients
        .filter(owner_id.eq(owner))
        .filter(due_date.lt(today))
        .count()
        .get_result(conn)?)
}

pub fn upsert_template(pool: &PgPool, template_name: &str, body: &str) -> Result<Template, DbError> {
    use self::schema::templates::dsl::*;

    let conn = &mut pool.get()?;

    Ok(diesel::insert_into(templates)
        .values(NewTemplate {
            name: template_name,
            content: body,
        })
        .on_conflict(name)
        .do_update()
        .set(content.eq(body))
        .get_result(conn)?)
}

/// Insert only when the name is free; used for seeding the default
/// reminder templates without clobbering operator edits.
pub fn create_template_if_missing(
    pool: &PgPool,
    template_name: &str,
    body: &str,
) -> Result<Option<Template>, DbError> {
    use self::schema::templates::dsl::*;

    let conn = &mut pool.get()?;

    Ok(diesel::insert_into(templates)
        .values(NewTemplate {
            name: template_name,
            content: body,
        })
        .on_conflict(name)
        .do_nothing()
        .get_result(conn)
        .optional()?)
}

pub fn find_template_by_name(
    pool: &PgPool,
    template_name: &str,
) -> Result<Option<Template>, DbError> {
    use self::schema::templates::dsl::*;

    let conn = &mut pool.get()?;

    Ok(templates
        .filter(name.eq(template_name))
        .first::<Template>(conn)
        .optional()?)
}

pub fn find_template_by_id(pool: &PgPool, template_id: i32) -> Result<Option<Template>, DbError> {
    use self::schema::templates::dsl::*;

    let conn = &mut pool.get()?;

    Ok(templates
        .filter(id.eq(template_id))
        .first::<Template>(conn)
        .optional()?)
}

pub fn list_templates(pool: &PgPool) -> Result<Vec<Template>, DbError> {
    use self::schema::templates::dsl::*;

    let conn = &mut pool.get()?;

    Ok(templates.order(name.asc()).load::<Template>(conn)?)
}

pub fn delete_template(pool: &PgPool, template_id: i32) -> Result<bool, DbError> {
    use self::schema::templates::dsl::*;

    let conn = &mut pool.get()?;

    let deleted = diesel::delete(templates.filter(id.eq(template_id))).execute(conn)?;

    Ok(deleted > 0)
}

pub fn create_delivery_log_entry(
    pool: &PgPool,
    entry: NewDeliveryLogEntry,
) -> Result<DeliveryLogEntry, DbError> {
    use self::schema::delivery_log;

    let conn = &mut pool.get()?;

    Ok(diesel::insert_into(delivery_log::table)
        .values(&entry)
        .get_result(conn)?)
}

pub fn find_delivery_log_by_client(
    pool: &PgPool,
    client: i32,
    limit: i64,
) -> Result<Vec<DeliveryLogEntry>, DbError> {
    use self::schema::delivery_log::dsl::*;

    let conn = &mut pool.get()?;

    Ok(delivery_log
        .filter(client_id.eq(client))
        .order(created_at.desc())
        .limit(limit)
        .load::<DeliveryLogEntry>(conn)?)
}

/// UTC bounds of one LOCAL_TZ calendar day: [local midnight, next local
/// midnight). Computing both ends as local midnights keeps DST-shortened or
/// -lengthened days covered.
fn local_day_window(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let to_utc = |d: NaiveDate| {
        let midnight = d.and_hms_opt(0, 0, 0).unwrap_or_default();
        match midnight.and_local_timezone(LOCAL_TZ).earliest() {
            Some(dt) => dt.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&midnight),
        }
    };

    (to_utc(day), to_utc(day + chrono::Duration::days(1)))
}

/// Idempotency check for the daily run: was an attempt already logged for
/// this client and template tag on the given LOCAL_TZ calendar day?
/// `created_at` is stored in UTC, so the day bounds are local midnights
/// converted to UTC; a late-evening dispatch that lands on the next UTC day
/// still counts against its local day.
pub fn has_delivery_on_day(
    pool: &PgPool,
    client: i32,
    template: &str,
    day: NaiveDate,
) -> Result<bool, DbError> {
    use self::schema::delivery_log::dsl::*;

    let conn = &mut pool.get()?;

    let (day_start, day_end) = local_day_window(day);

    let count: i64 = delivery_log
        .filter(client_id.eq(client))
        .filter(template_name.eq(template))
        .filter(created_at.ge(day_start))
        .filter(created_at.lt(day_end))
        .count()
        .get_result(conn)?;

    Ok(count > 0)
}

pub fn get_conversation_state(
    pool: &PgPool,
    operator: i64,
) -> Result<Option<ConversationState>, DbError> {
    use self::schema::conversation_states::dsl::*;

    let conn = &mut pool.get()?;

    Ok(conversation_states
        .filter(operator_id.eq(operator))
        .filter(expires_at.gt(Utc::now()))
        .first::<ConversationState>(conn)
        .optional()?)
}

pub fn set_conversation_state(
    pool: &PgPool,
    operator: i64,
    new_state: &str,
    new_state_data: Option<serde_json::Value>,
    new_expires_at: DateTime<Utc>,
) -> Result<ConversationState, DbError> {
    use self::schema::conversation_states::dsl::*;

    let conn = &mut pool.get()?;

    let existing = conversation_states
        .filter(operator_id.eq(operator))
        .first::<ConversationState>(conn)
        .optional()?;

    if existing.is_some() {
        Ok(
            diesel::update(conversation_states.filter(operator_id.eq(operator)))
                .set((
                    state.eq(new_state),
                    state_data.eq(new_state_data),
                    expires_at.eq(new_expires_at),
                    updated_at.eq(Utc::now()),
                ))
                .get_result(conn)?,
        )
    } else {
        let new_conversation_state = NewConversationState {
            operator_id: operator,
            state: new_state,
            state_data: new_state_data,
            expires_at: new_expires_at,
        };

        Ok(diesel::insert_into(conversation_states)
            .values(&new_conversation_state)
            .get_result(conn)?)
    }
}

pub fn clear_conversation_state(pool: &PgPool, operator: i64) -> Result<bool, DbError> {
    use self::schema::conversation_states::dsl::*;

    let conn = &mut pool.get()?;

    let deleted =
        diesel::delete(conversation_states.filter(operator_id.eq(operator))).execute(conn)?;

    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_day_window_is_local_midnight_to_midnight() {
        // São Paulo is UTC-3 on this date: the local day runs 03:00Z to 03:00Z.
        let day = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let (start, end) = local_day_window(day);

        assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 10, 3, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 6, 11, 3, 0, 0).unwrap());
    }

    #[test]
    fn test_local_day_window_covers_late_evening_dispatch() {
        // A 22:00 local dispatch is logged at 01:00Z on the next UTC day; it
        // must still fall inside its own local day.
        let day = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let (start, end) = local_day_window(day);

        let late_local = Utc.with_ymd_and_hms(2025, 6, 11, 1, 0, 0).unwrap();
        assert!(late_local >= start && late_local < end);

        // And the next local day does not claim it.
        let (next_start, _) = local_day_window(day + chrono::Duration::days(1));
        assert!(late_local < next_start);
    }
}
