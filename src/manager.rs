use crate::error::{Error, Result};
use crate::models::{
    Attendance, AttendanceFilter, AttendanceRecord, MarkSummary, NewAttendance, NewStudent,
    Status, Student,
};
use crate::schema;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// The schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// The manager for recording, modifying, and retrieving attendance data.
///
/// It owns the database connection, so every operation goes through an explicitly constructed
/// manager rather than a process-wide handle.
pub struct AttendanceManager {
    db: SqliteConnection,
}

impl AttendanceManager {
    /// Creates a new `AttendanceManager` by connecting to the `sqlite3` database at `database_url`.
    ///
    /// This does not create the tables; call [`AttendanceManager::run_migrations`] for that.
    pub fn connect(database_url: &str) -> Result<Self> {
        let mut db =
            SqliteConnection::establish(database_url).map_err(|source| Error::Connection {
                url: database_url.to_string(),
                source,
            })?;

        // Foreign keys are off by default in SQLite, and the cascade from students to their
        // attendance depends on them.
        diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut db)?;
        diesel::sql_query("PRAGMA busy_timeout = 5000").execute(&mut db)?;

        Ok(Self { db })
    }

    /// Connects to a fresh in-memory database with the schema already applied.
    pub fn in_memory() -> Result<Self> {
        let mut manager = Self::connect(":memory:")?;
        manager.run_migrations()?;
        Ok(manager)
    }

    /// Applies any pending schema migrations and returns how many ran.
    pub fn run_migrations(&mut self) -> Result<usize> {
        let applied = self
            .db
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| Error::Migration(err.to_string()))?;

        for version in &applied {
            info!(%version, "applied migration");
        }

        Ok(applied.len())
    }

    /// Returns the total number of students on the roster.
    pub fn num_students(&mut self) -> Result<usize> {
        use schema::students::dsl::*;

        let count: i64 = students.count().get_result(&mut self.db)?;
        Ok(count as usize)
    }

    /// Returns the total number of attendance records across all dates.
    pub fn num_records(&mut self) -> Result<usize> {
        use schema::attendance::dsl::*;

        let count: i64 = attendance.count().get_result(&mut self.db)?;
        Ok(count as usize)
    }

    /// Retrieves all students on the roster, ordered by roll number.
    pub fn get_roster(&mut self) -> Result<Vec<Student>> {
        Ok(load_roster(&mut self.db)?)
    }

    /// Retrieves a specific student from the roster based on their ID.
    pub fn get_student(&mut self, student_id: i32) -> Result<Student> {
        use schema::students::dsl::*;

        students
            .find(student_id)
            .select(Student::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or(Error::StudentNotFound(student_id))
    }

    /// Adds a student to the roster.
    ///
    /// Fails with [`Error::DuplicateRollNumber`] if the roll number is already taken, in which case
    /// the roster is left unchanged.
    pub fn add_student(&mut self, new_student: &NewStudent<'_>) -> Result<Student> {
        let student = diesel::insert_into(schema::students::table)
            .values(new_student)
            .returning(Student::as_returning())
            .get_result(&mut self.db)
            .map_err(|err| duplicate_roll_number(err, new_student.roll_no))?;

        info!(id = student.id, roll_no = %student.roll_no, "added student");
        Ok(student)
    }

    /// Inserts several students in one transaction, skipping roll numbers that already exist.
    ///
    /// Returns the students that were added and the roll numbers that were skipped.
    pub fn insert_students(
        &mut self,
        new_students: &[NewStudent<'_>],
    ) -> Result<(Vec<Student>, Vec<String>)> {
        self.db.transaction(|conn| {
            let mut added = Vec::new();
            let mut skipped = Vec::new();

            for new_student in new_students {
                let inserted = diesel::insert_into(schema::students::table)
                    .values(new_student)
                    .on_conflict(schema::students::roll_no)
                    .do_nothing()
                    .returning(Student::as_returning())
                    .get_result(conn)
                    .optional()?;

                match inserted {
                    Some(student) => added.push(student),
                    None => skipped.push(new_student.roll_no.to_string()),
                }
            }

            Ok::<_, Error>((added, skipped))
        })
    }

    /// Overwrites a student's roll number, name and section.
    ///
    /// The roll number may stay the same; it only conflicts if a *different* student holds it.
    pub fn update_student(&mut self, student_id: i32, changes: &NewStudent<'_>) -> Result<Student> {
        let student = diesel::update(schema::students::table.find(student_id))
            .set(changes)
            .returning(Student::as_returning())
            .get_result(&mut self.db)
            .map_err(|err| match err {
                DieselError::NotFound => Error::StudentNotFound(student_id),
                err => duplicate_roll_number(err, changes.roll_no),
            })?;

        info!(id = student.id, roll_no = %student.roll_no, "updated student");
        Ok(student)
    }

    /// Removes and returns a student from the roster given their ID, along with every attendance
    /// record that belongs to them.
    pub fn delete_student(&mut self, student_id: i32) -> Result<Student> {
        let (student, removed_records) = self.db.transaction(|conn| {
            let student = schema::students::table
                .find(student_id)
                .select(Student::as_select())
                .first(conn)
                .optional()?
                .ok_or(Error::StudentNotFound(student_id))?;

            let removed_records = diesel::delete(Attendance::belonging_to(&student)).execute(conn)?;
            diesel::delete(schema::students::table.find(student_id)).execute(conn)?;

            Ok::<_, Error>((student, removed_records))
        })?;

        info!(
            id = student.id,
            roll_no = %student.roll_no,
            removed_records,
            "deleted student"
        );
        Ok(student)
    }

    /// For a given date, marks every student in `present_ids` as [`Status::Present`] and every
    /// other student on the roster as [`Status::Absent`].
    ///
    /// Each student ends up with exactly one record for `date`: an existing record has its status
    /// overwritten in place, otherwise a new one is inserted. Submitting the same IDs twice leaves
    /// the same records behind.
    ///
    /// If `present_ids` contains an ID that is not on the roster, this function will ignore it.
    pub fn mark_attendance(
        &mut self,
        date: NaiveDate,
        present_ids: &HashSet<i32>,
    ) -> Result<MarkSummary> {
        let summary = self.db.transaction(|conn| {
            let roster = load_roster(conn)?;

            for id in present_ids {
                if !roster.iter().any(|student| student.id == *id) {
                    warn!(id = *id, %date, "tried to mark an unknown student as present");
                }
            }

            let mut summary = MarkSummary::default();
            for student in &roster {
                let status = if present_ids.contains(&student.id) {
                    Status::Present
                } else {
                    Status::Absent
                };

                diesel::insert_into(schema::attendance::table)
                    .values(&NewAttendance {
                        student_id: student.id,
                        date,
                        status,
                    })
                    .on_conflict((schema::attendance::student_id, schema::attendance::date))
                    .do_update()
                    .set(schema::attendance::status.eq(status))
                    .execute(conn)?;

                summary.record(status);
            }

            Ok::<_, Error>(summary)
        })?;

        info!(
            %date,
            present = summary.present,
            absent = summary.absent,
            "marked attendance"
        );
        Ok(summary)
    }

    /// Returns the attendance records for a single date.
    pub fn get_date_attendance(&mut self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        self.get_attendance(&AttendanceFilter {
            date: Some(date),
            section: None,
        })
    }

    /// Returns attendance records joined with their students, narrowed by `filter` and sorted by
    /// roll number, then date.
    pub fn get_attendance(&mut self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>> {
        use schema::{attendance, students};

        let mut query = attendance::table
            .inner_join(students::table)
            .select((Attendance::as_select(), Student::as_select()))
            .order_by((students::roll_no.asc(), attendance::date.asc()))
            .into_boxed();

        if let Some(date) = filter.date {
            query = query.filter(attendance::date.eq(date));
        }
        if let Some(section) = &filter.section {
            query = query.filter(students::section.eq(section.as_str()));
        }

        let rows: Vec<(Attendance, Student)> = query.load(&mut self.db)?;
        debug!(?filter, rows = rows.len(), "loaded attendance");

        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    /// Every date that has at least one attendance record, most recent first.
    pub fn attendance_dates(&mut self) -> Result<Vec<NaiveDate>> {
        use schema::attendance::dsl::*;

        Ok(attendance
            .select(date)
            .distinct()
            .order_by(date.desc())
            .load(&mut self.db)?)
    }

    /// Every section that has at least one student, in ascending order.
    pub fn sections(&mut self) -> Result<Vec<String>> {
        use schema::students::dsl::*;

        Ok(students
            .select(section)
            .distinct()
            .order_by(section.asc())
            .load(&mut self.db)?)
    }
}

fn load_roster(conn: &mut SqliteConnection) -> QueryResult<Vec<Student>> {
    use schema::students::dsl::*;

    students
        .select(Student::as_select())
        .order_by(roll_no.asc())
        .load(conn)
}

/// Translates a unique-constraint violation on `students.roll_no` into a user-facing error.
fn duplicate_roll_number(err: DieselError, roll_no: &str) -> Error {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            Error::DuplicateRollNumber {
                roll_no: roll_no.to_string(),
            }
        }
        err => Error::Database(err),
    }
}
