//! Catalog service.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use jiff::civil::Date;
use mockall::automock;
use tracing::{debug, instrument};

use crate::{
    domain::catalog::{
        errors::CatalogServiceError,
        models::{
            Availability, Course, CourseFilter, CourseId, ScheduleId, ScheduleInstance,
            ScheduleWithCourse, compute_availability, is_bookable,
        },
        repository::{CoursesRepository, SchedulesRepository},
    },
    store::DocumentStore,
};

#[derive(Debug, Clone)]
pub struct StoreCatalogService {
    store: Arc<dyn DocumentStore>,
    courses_repository: CoursesRepository,
    schedules_repository: SchedulesRepository,
}

impl StoreCatalogService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            courses_repository: CoursesRepository::new(),
            schedules_repository: SchedulesRepository::new(),
        }
    }
}

#[async_trait]
impl CatalogService for StoreCatalogService {
    #[instrument(skip(self), fields(course = %course))]
    async fn get_course(&self, course: &CourseId) -> Result<Course, CatalogServiceError> {
        self.courses_repository
            .get_course(self.store.as_ref(), course)
            .await?
            .ok_or(CatalogServiceError::NotFound)
    }

    async fn list_courses(&self, filter: CourseFilter) -> Result<Vec<Course>, CatalogServiceError> {
        let courses = self
            .courses_repository
            .list_courses(self.store.as_ref(), &filter)
            .await?;

        debug!(count = courses.len(), "listed courses");

        Ok(courses)
    }

    #[instrument(skip(self), fields(schedule = %schedule))]
    async fn get_schedule(
        &self,
        schedule: &ScheduleId,
    ) -> Result<ScheduleInstance, CatalogServiceError> {
        self.schedules_repository
            .get_schedule(self.store.as_ref(), schedule)
            .await?
            .ok_or(CatalogServiceError::NotFound)
    }

    async fn list_schedules_for_course(
        &self,
        course: &CourseId,
    ) -> Result<Vec<ScheduleInstance>, CatalogServiceError> {
        Ok(self
            .schedules_repository
            .list_for_course(self.store.as_ref(), course)
            .await?)
    }

    async fn list_available_schedules(
        &self,
        as_of: Date,
    ) -> Result<Vec<ScheduleInstance>, CatalogServiceError> {
        let schedules = self
            .schedules_repository
            .list_after(self.store.as_ref(), as_of)
            .await?;

        debug!(count = schedules.len(), %as_of, "listed available schedules");

        Ok(schedules)
    }

    async fn search_schedules_by_teacher(
        &self,
        teacher: &str,
    ) -> Result<Vec<ScheduleInstance>, CatalogServiceError> {
        let needle = teacher.to_lowercase();

        let mut schedules = self
            .schedules_repository
            .list_by_teacher(self.store.as_ref())
            .await?;

        schedules.retain(|schedule| schedule.teacher.to_lowercase().contains(&needle));

        Ok(schedules)
    }

    async fn list_schedules_with_courses(
        &self,
        from: Option<Date>,
        to: Option<Date>,
    ) -> Result<Vec<ScheduleWithCourse>, CatalogServiceError> {
        let schedules = self
            .schedules_repository
            .list_between(self.store.as_ref(), from, to)
            .await?;

        let mut courses: HashMap<CourseId, Option<Course>> = HashMap::new();

        for schedule in &schedules {
            if courses.contains_key(&schedule.course_id) {
                continue;
            }

            let course = self
                .courses_repository
                .get_course(self.store.as_ref(), &schedule.course_id)
                .await?;

            courses.insert(schedule.course_id.clone(), course);
        }

        Ok(schedules
            .into_iter()
            .map(|schedule| {
                let course = courses.get(&schedule.course_id).cloned().flatten();

                ScheduleWithCourse { schedule, course }
            })
            .collect())
    }

    #[instrument(skip(self), fields(course = %course, schedule = %schedule))]
    async fn check_availability(
        &self,
        course: &CourseId,
        schedule: &ScheduleId,
        today: Date,
    ) -> Result<Availability, CatalogServiceError> {
        let schedule = self.get_schedule(schedule).await?;

        if !is_bookable(&schedule, today) {
            return Err(CatalogServiceError::ScheduleInPast);
        }

        let course = self.get_course(course).await?;

        Ok(compute_availability(&schedule, &course))
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Retrieve a single course.
    async fn get_course(&self, course: &CourseId) -> Result<Course, CatalogServiceError>;

    /// List courses matching `filter`, in Monday-first week order then start time.
    async fn list_courses(&self, filter: CourseFilter) -> Result<Vec<Course>, CatalogServiceError>;

    /// Retrieve a single schedule instance.
    async fn get_schedule(
        &self,
        schedule: &ScheduleId,
    ) -> Result<ScheduleInstance, CatalogServiceError>;

    /// Instances of a course, by date ascending.
    async fn list_schedules_for_course(
        &self,
        course: &CourseId,
    ) -> Result<Vec<ScheduleInstance>, CatalogServiceError>;

    /// Instances dated strictly after `as_of`, by date ascending.
    async fn list_available_schedules(
        &self,
        as_of: Date,
    ) -> Result<Vec<ScheduleInstance>, CatalogServiceError>;

    /// Case-insensitive teacher substring search.
    async fn search_schedules_by_teacher(
        &self,
        teacher: &str,
    ) -> Result<Vec<ScheduleInstance>, CatalogServiceError>;

    /// Instances within an optional date window, joined with their courses.
    async fn list_schedules_with_courses(
        &self,
        from: Option<Date>,
        to: Option<Date>,
    ) -> Result<Vec<ScheduleWithCourse>, CatalogServiceError>;

    /// Seats left on a future instance.
    async fn check_availability(
        &self,
        course: &CourseId,
        schedule: &ScheduleId,
        today: Date,
    ) -> Result<Availability, CatalogServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        domain::catalog::models::{ClassType, DayOfWeek},
        store::{Collection, StoreError},
        test::{TestContext, fixtures},
    };

    use super::*;

    #[tokio::test]
    async fn get_course_returns_seeded_course() -> TestResult {
        let ctx = TestContext::new().await;

        let course = ctx.catalog.get_course(&ctx.flow_course).await?;

        assert_eq!(course.id, ctx.flow_course);
        assert_eq!(course.class_type, ClassType::FlowYoga);
        assert_eq!(course.capacity, 10);

        Ok(())
    }

    #[tokio::test]
    async fn get_course_unknown_id_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.catalog.get_course(&CourseId::new("missing")).await;

        assert!(
            matches!(result, Err(CatalogServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn list_courses_uses_week_order_not_alphabetical() -> TestResult {
        let ctx = TestContext::empty().await;

        ctx.seed_course(&fixtures::course("sun", DayOfWeek::Sunday, "09:00", 10))
            .await;
        ctx.seed_course(&fixtures::course("mon", DayOfWeek::Monday, "09:00", 10))
            .await;
        ctx.seed_course(&fixtures::course("fri", DayOfWeek::Friday, "09:00", 10))
            .await;

        let ids: Vec<String> = ctx
            .catalog
            .list_courses(CourseFilter::default())
            .await?
            .into_iter()
            .map(|course| course.id.into_string())
            .collect();

        assert_eq!(ids, vec!["mon", "fri", "sun"]);

        Ok(())
    }

    #[tokio::test]
    async fn list_courses_orders_same_day_by_clock_time() -> TestResult {
        let ctx = TestContext::empty().await;

        ctx.seed_course(&fixtures::course("late", DayOfWeek::Monday, "18:00", 10))
            .await;
        ctx.seed_course(&fixtures::course("early", DayOfWeek::Monday, "9:30", 10))
            .await;

        let ids: Vec<String> = ctx
            .catalog
            .list_courses(CourseFilter::for_day(DayOfWeek::Monday))
            .await?
            .into_iter()
            .map(|course| course.id.into_string())
            .collect();

        assert_eq!(ids, vec!["early", "late"]);

        Ok(())
    }

    #[tokio::test]
    async fn list_courses_applies_every_filter() -> TestResult {
        let ctx = TestContext::empty().await;

        let mut pricey = fixtures::course("pricey", DayOfWeek::Monday, "09:00", 20);
        pricey.price = Decimal::from(45);

        let mut small = fixtures::course("small", DayOfWeek::Monday, "09:00", 4);
        small.class_type = ClassType::AerialYoga;

        ctx.seed_course(&pricey).await;
        ctx.seed_course(&small).await;
        ctx.seed_course(&fixtures::course("fit", DayOfWeek::Monday, "09:00", 12))
            .await;

        let filter = CourseFilter {
            max_price: Some(Decimal::from(30)),
            min_capacity: Some(5),
            ..CourseFilter::for_day(DayOfWeek::Monday)
        };

        let courses = ctx.catalog.list_courses(filter).await?;

        assert_eq!(courses.len(), 1);
        assert_eq!(courses.first().map(|c| c.id.as_str()), Some("fit"));

        let aerial = ctx
            .catalog
            .list_courses(CourseFilter::for_type(ClassType::AerialYoga))
            .await?;

        assert_eq!(aerial.len(), 1);
        assert_eq!(aerial.first().map(|c| c.id.as_str()), Some("small"));

        Ok(())
    }

    #[tokio::test]
    async fn list_courses_skips_invalid_documents() -> TestResult {
        let ctx = TestContext::empty().await;

        ctx.seed_course(&fixtures::course("ok", DayOfWeek::Monday, "09:00", 10))
            .await;
        ctx.store
            .seed(
                Collection::Courses,
                "broken",
                fixtures::fields(serde_json::json!({ "dayOfWeek": "Funday" })),
            )
            .await;

        let courses = ctx.catalog.list_courses(CourseFilter::default()).await?;

        assert_eq!(courses.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn reads_are_repeatable() -> TestResult {
        let ctx = TestContext::new().await;

        let first = ctx.catalog.list_courses(CourseFilter::default()).await?;
        let second = ctx.catalog.list_courses(CourseFilter::default()).await?;

        assert_eq!(first, second);

        let first = ctx.catalog.list_available_schedules(ctx.today).await?;
        let second = ctx.catalog.list_available_schedules(ctx.today).await?;

        assert_eq!(first, second);

        let first = ctx.catalog.get_course(&ctx.flow_course).await?;
        let second = ctx.catalog.get_course(&ctx.flow_course).await?;

        assert_eq!(first, second);

        Ok(())
    }

    #[tokio::test]
    async fn available_schedules_exclude_today() -> TestResult {
        let ctx = TestContext::empty().await;

        ctx.seed_course(&fixtures::course("c1", DayOfWeek::Monday, "09:00", 10))
            .await;
        ctx.seed_schedule(&fixtures::schedule("yesterday", "c1", date(2026, 10, 15), "Ana"))
            .await;
        ctx.seed_schedule(&fixtures::schedule("today", "c1", ctx.today, "Ana"))
            .await;
        ctx.seed_schedule(&fixtures::schedule("later", "c1", date(2026, 10, 20), "Ana"))
            .await;
        ctx.seed_schedule(&fixtures::schedule("tomorrow", "c1", date(2026, 10, 17), "Ana"))
            .await;

        let ids: Vec<String> = ctx
            .catalog
            .list_available_schedules(ctx.today)
            .await?
            .into_iter()
            .map(|schedule| schedule.id.into_string())
            .collect();

        assert_eq!(ids, vec!["tomorrow", "later"]);

        Ok(())
    }

    #[tokio::test]
    async fn schedules_for_course_are_date_ordered() -> TestResult {
        let ctx = TestContext::empty().await;

        ctx.seed_schedule(&fixtures::schedule("b", "c1", date(2026, 11, 2), "Ana"))
            .await;
        ctx.seed_schedule(&fixtures::schedule("a", "c1", date(2026, 10, 26), "Ana"))
            .await;
        ctx.seed_schedule(&fixtures::schedule("other", "c2", date(2026, 10, 20), "Ana"))
            .await;

        let ids: Vec<String> = ctx
            .catalog
            .list_schedules_for_course(&CourseId::new("c1"))
            .await?
            .into_iter()
            .map(|schedule| schedule.id.into_string())
            .collect();

        assert_eq!(ids, vec!["a", "b"]);

        Ok(())
    }

    #[tokio::test]
    async fn teacher_search_is_case_insensitive_substring() -> TestResult {
        let ctx = TestContext::empty().await;

        ctx.seed_schedule(&fixtures::schedule("s1", "c1", date(2026, 10, 20), "Maria Lopez"))
            .await;
        ctx.seed_schedule(&fixtures::schedule("s2", "c1", date(2026, 10, 21), "Tom"))
            .await;
        ctx.seed_schedule(&fixtures::schedule("s3", "c1", date(2026, 10, 19), "ROSEMARIE"))
            .await;

        let ids: Vec<String> = ctx
            .catalog
            .search_schedules_by_teacher("mari")
            .await?
            .into_iter()
            .map(|schedule| schedule.id.into_string())
            .collect();

        assert_eq!(ids, vec!["s1", "s3"]);

        Ok(())
    }

    #[tokio::test]
    async fn schedules_join_courses_and_tolerate_missing_ones() -> TestResult {
        let ctx = TestContext::empty().await;

        ctx.seed_course(&fixtures::course("c1", DayOfWeek::Monday, "09:00", 10))
            .await;
        ctx.seed_schedule(&fixtures::schedule("s1", "c1", date(2026, 10, 20), "Ana"))
            .await;
        ctx.seed_schedule(&fixtures::schedule("s2", "gone", date(2026, 10, 21), "Ana"))
            .await;
        ctx.seed_schedule(&fixtures::schedule("s3", "c1", date(2026, 12, 1), "Ana"))
            .await;

        let joined = ctx
            .catalog
            .list_schedules_with_courses(Some(date(2026, 10, 18)), Some(date(2026, 10, 31)))
            .await?;

        assert_eq!(joined.len(), 2);
        assert_eq!(
            joined.first().and_then(|j| j.course.as_ref()).map(|c| c.id.as_str()),
            Some("c1")
        );
        assert!(joined.get(1).is_some_and(|j| j.course.is_none()));

        Ok(())
    }

    #[tokio::test]
    async fn availability_for_fresh_schedule_is_full_capacity() -> TestResult {
        let ctx = TestContext::new().await;

        let availability = ctx
            .catalog
            .check_availability(&ctx.flow_course, &ctx.tomorrow_schedule, ctx.today)
            .await?;

        assert_eq!(
            availability,
            Availability {
                available: true,
                available_spots: 10,
                capacity: 10
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn availability_rejects_schedules_dated_today() {
        let ctx = TestContext::empty().await;

        ctx.seed_course(&fixtures::course("c1", DayOfWeek::Monday, "09:00", 10))
            .await;
        ctx.seed_schedule(&fixtures::schedule("s1", "c1", ctx.today, "Ana"))
            .await;

        let result = ctx
            .catalog
            .check_availability(&CourseId::new("c1"), &ScheduleId::new("s1"), ctx.today)
            .await;

        assert!(
            matches!(result, Err(CatalogServiceError::ScheduleInPast)),
            "expected ScheduleInPast, got {result:?}"
        );
    }

    #[tokio::test]
    async fn store_failures_surface_as_store_errors() {
        let ctx = TestContext::new().await;

        ctx.store
            .fail_next_read(Collection::Courses, StoreError::DeadlineExceeded)
            .await;

        let result = ctx.catalog.list_courses(CourseFilter::default()).await;

        assert!(
            matches!(result, Err(CatalogServiceError::Store(StoreError::DeadlineExceeded))),
            "expected Store(DeadlineExceeded), got {result:?}"
        );
    }
}
