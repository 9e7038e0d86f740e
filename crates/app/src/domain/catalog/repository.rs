//! Catalog Repositories

use jiff::{Timestamp, civil::Date};
use serde_json::json;

use crate::{
    domain::catalog::models::{
        Course, CourseFilter, CourseId, RosterEntry, ScheduleId, ScheduleInstance,
    },
    store::{
        Collection, Direction, DocumentStore, Fields, FilterOp, Query, Record, StoreError,
        Transaction, decode_valid,
    },
};

#[derive(Debug, Clone, Default)]
pub(crate) struct CoursesRepository;

impl CoursesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_course(
        &self,
        store: &dyn DocumentStore,
        course: &CourseId,
    ) -> Result<Option<Course>, StoreError> {
        store
            .get(Collection::Courses, course.as_str())
            .await?
            .map(Course::from_store)
            .transpose()
    }

    pub(crate) async fn get_course_in(
        &self,
        tx: &mut dyn Transaction,
        course: &CourseId,
    ) -> Result<Option<Course>, StoreError> {
        tx.get(Collection::Courses, course.as_str())
            .await?
            .map(Course::from_store)
            .transpose()
    }

    /// Equality predicates run in the store, range predicates afterwards.
    ///
    /// Results are ordered by week day then start time; the store's own
    /// ordering would put "Friday" before "Monday".
    pub(crate) async fn list_courses(
        &self,
        store: &dyn DocumentStore,
        filter: &CourseFilter,
    ) -> Result<Vec<Course>, StoreError> {
        let mut query = Query::new();

        if let Some(day) = filter.day_of_week {
            query = query.eq("dayOfWeek", day.name());
        }

        if let Some(time) = &filter.time {
            query = query.eq("time", time.as_str());
        }

        if let Some(class_type) = filter.class_type {
            query = query.eq("type", class_type.name());
        }

        let mut courses: Vec<Course> =
            decode_valid(store.query(Collection::Courses, &query).await?);

        courses.retain(|course| filter.admits(course));
        courses.sort_by_key(|course| (course.day_of_week, course.start_time()));

        Ok(courses)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SchedulesRepository;

impl SchedulesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_schedule(
        &self,
        store: &dyn DocumentStore,
        schedule: &ScheduleId,
    ) -> Result<Option<ScheduleInstance>, StoreError> {
        store
            .get(Collection::Schedules, schedule.as_str())
            .await?
            .map(ScheduleInstance::from_store)
            .transpose()
    }

    pub(crate) async fn get_schedule_in(
        &self,
        tx: &mut dyn Transaction,
        schedule: &ScheduleId,
    ) -> Result<Option<ScheduleInstance>, StoreError> {
        tx.get(Collection::Schedules, schedule.as_str())
            .await?
            .map(ScheduleInstance::from_store)
            .transpose()
    }

    pub(crate) async fn list_for_course(
        &self,
        store: &dyn DocumentStore,
        course: &CourseId,
    ) -> Result<Vec<ScheduleInstance>, StoreError> {
        let query = Query::new()
            .eq("courseId", course.as_str())
            .order_by("date", Direction::Ascending);

        Ok(decode_valid(store.query(Collection::Schedules, &query).await?))
    }

    /// Instances dated within `[from, to]`, either bound optional.
    pub(crate) async fn list_between(
        &self,
        store: &dyn DocumentStore,
        from: Option<Date>,
        to: Option<Date>,
    ) -> Result<Vec<ScheduleInstance>, StoreError> {
        let mut query = Query::new();

        if let Some(from) = from {
            query = query.filter("date", FilterOp::Ge, from.to_string());
        }

        if let Some(to) = to {
            query = query.filter("date", FilterOp::Le, to.to_string());
        }

        let query = query.order_by("date", Direction::Ascending);

        Ok(decode_valid(store.query(Collection::Schedules, &query).await?))
    }

    pub(crate) async fn list_after(
        &self,
        store: &dyn DocumentStore,
        as_of: Date,
    ) -> Result<Vec<ScheduleInstance>, StoreError> {
        let query = Query::new()
            .filter("date", FilterOp::Gt, as_of.to_string())
            .order_by("date", Direction::Ascending);

        Ok(decode_valid(store.query(Collection::Schedules, &query).await?))
    }

    pub(crate) async fn list_by_teacher(
        &self,
        store: &dyn DocumentStore,
    ) -> Result<Vec<ScheduleInstance>, StoreError> {
        let query = Query::new()
            .order_by("teacher", Direction::Ascending)
            .order_by("date", Direction::Ascending);

        Ok(decode_valid(store.query(Collection::Schedules, &query).await?))
    }

    /// Buffer a roster replacement in `tx`.
    pub(crate) fn write_roster(
        &self,
        tx: &mut dyn Transaction,
        schedule: &ScheduleId,
        roster: &[RosterEntry],
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let roster = serde_json::to_value(roster)
            .map_err(|source| StoreError::InvalidArgument(source.to_string()))?;

        let mut fields = Fields::new();
        fields.insert("bookings".to_string(), roster);
        fields.insert("lastUpdated".to_string(), json!(now.as_millisecond()));

        tx.update(Collection::Schedules, schedule.as_str(), fields);

        Ok(())
    }
}
