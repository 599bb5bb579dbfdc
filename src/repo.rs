//! Stateless query layer. One module per table; every function takes the
//! pool explicitly, so no entity ever carries a live connection.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Attendance, AttendanceWithStudent, Class, Group, Session, Student};

pub mod classes {
    use super::*;

    pub async fn find_all(pg: &PgPool) -> sqlx::Result<Vec<Class>> {
        sqlx::query_as::<_, Class>("SELECT * FROM classes ORDER BY created_at")
            .fetch_all(pg)
            .await
    }

    pub async fn find_by_id(pg: &PgPool, id: Uuid) -> sqlx::Result<Option<Class>> {
        sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = $1 LIMIT 1")
            .bind(id)
            .fetch_optional(pg)
            .await
    }

    pub async fn exists(pg: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM classes WHERE id = $1)")
            .bind(id)
            .fetch_one(pg)
            .await
    }

    pub async fn insert(pg: &PgPool, class: &Class) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO classes (id, name, speciality, level, year, semester, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(class.id)
        .bind(&class.name)
        .bind(&class.speciality)
        .bind(&class.level)
        .bind(&class.year)
        .bind(&class.semester)
        .bind(class.created_at)
        .bind(class.updated_at)
        .execute(pg)
        .await?;
        Ok(())
    }

    pub async fn update(pg: &PgPool, class: &Class) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE classes SET name = $2, speciality = $3, level = $4, year = $5, \
             semester = $6, updated_at = $7 WHERE id = $1",
        )
        .bind(class.id)
        .bind(&class.name)
        .bind(&class.speciality)
        .bind(&class.level)
        .bind(&class.year)
        .bind(&class.semester)
        .bind(class.updated_at)
        .execute(pg)
        .await?;
        Ok(())
    }

    pub async fn delete(pg: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        let done = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(pg)
            .await?;
        Ok(done.rows_affected() >= 1)
    }
}

pub mod groups {
    use super::*;

    pub async fn find_all(pg: &PgPool) -> sqlx::Result<Vec<Group>> {
        sqlx::query_as::<_, Group>("SELECT * FROM groups ORDER BY created_at")
            .fetch_all(pg)
            .await
    }

    pub async fn find_by_class(pg: &PgPool, class_id: Uuid) -> sqlx::Result<Vec<Group>> {
        sqlx::query_as::<_, Group>(
            "SELECT * FROM groups WHERE class_id = $1 ORDER BY created_at",
        )
        .bind(class_id)
        .fetch_all(pg)
        .await
    }

    /// Scoped lookup: both the group id and its parent class must match.
    pub async fn find_scoped(
        pg: &PgPool,
        class_id: Uuid,
        group_id: Uuid,
    ) -> sqlx::Result<Option<Group>> {
        sqlx::query_as::<_, Group>(
            "SELECT * FROM groups WHERE id = $1 AND class_id = $2 LIMIT 1",
        )
        .bind(group_id)
        .bind(class_id)
        .fetch_optional(pg)
        .await
    }

    pub async fn exists(pg: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM groups WHERE id = $1)")
            .bind(id)
            .fetch_one(pg)
            .await
    }

    pub async fn insert(pg: &PgPool, group: &Group) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO groups (id, name, type, class_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(&group.kind)
        .bind(group.class_id)
        .bind(group.created_at)
        .bind(group.updated_at)
        .execute(pg)
        .await?;
        Ok(())
    }

    pub async fn update(pg: &PgPool, group: &Group) -> sqlx::Result<()> {
        sqlx::query("UPDATE groups SET name = $2, type = $3, updated_at = $4 WHERE id = $1")
            .bind(group.id)
            .bind(&group.name)
            .bind(&group.kind)
            .bind(group.updated_at)
            .execute(pg)
            .await?;
        Ok(())
    }

    pub async fn delete_scoped(pg: &PgPool, class_id: Uuid, group_id: Uuid) -> sqlx::Result<bool> {
        let done = sqlx::query("DELETE FROM groups WHERE id = $1 AND class_id = $2")
            .bind(group_id)
            .bind(class_id)
            .execute(pg)
            .await?;
        Ok(done.rows_affected() >= 1)
    }
}

pub mod students {
    use super::*;

    pub async fn find_all(pg: &PgPool) -> sqlx::Result<Vec<Student>> {
        sqlx::query_as::<_, Student>("SELECT * FROM students ORDER BY created_at")
            .fetch_all(pg)
            .await
    }

    pub async fn find_by_group(pg: &PgPool, group_id: Uuid) -> sqlx::Result<Vec<Student>> {
        sqlx::query_as::<_, Student>(
            "SELECT * FROM students WHERE group_id = $1 ORDER BY created_at",
        )
        .bind(group_id)
        .fetch_all(pg)
        .await
    }

    pub async fn find_scoped(
        pg: &PgPool,
        group_id: Uuid,
        id: Uuid,
    ) -> sqlx::Result<Option<Student>> {
        sqlx::query_as::<_, Student>(
            "SELECT * FROM students WHERE id = $1 AND group_id = $2 LIMIT 1",
        )
        .bind(id)
        .bind(group_id)
        .fetch_optional(pg)
        .await
    }

    pub async fn exists(pg: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
            .bind(id)
            .fetch_one(pg)
            .await
    }

    pub async fn insert(pg: &PgPool, student: &Student) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO students (id, fname, name, email, group_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(student.id)
        .bind(&student.fname)
        .bind(&student.name)
        .bind(&student.email)
        .bind(student.group_id)
        .bind(student.created_at)
        .bind(student.updated_at)
        .execute(pg)
        .await?;
        Ok(())
    }

    /// Bulk insert for the import pipeline. The whole batch commits in one
    /// transaction: any failure leaves the table untouched.
    pub async fn insert_many(pg: &PgPool, students: &[Student]) -> sqlx::Result<()> {
        let mut tx = pg.begin().await?;
        for student in students {
            sqlx::query(
                "INSERT INTO students (id, fname, name, email, group_id, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(student.id)
            .bind(&student.fname)
            .bind(&student.name)
            .bind(&student.email)
            .bind(student.group_id)
            .bind(student.created_at)
            .bind(student.updated_at)
            .execute(&mut tx)
            .await?;
        }
        tx.commit().await
    }

    pub async fn update(pg: &PgPool, student: &Student) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE students SET fname = $2, name = $3, email = $4, group_id = $5, \
             updated_at = $6 WHERE id = $1",
        )
        .bind(student.id)
        .bind(&student.fname)
        .bind(&student.name)
        .bind(&student.email)
        .bind(student.group_id)
        .bind(student.updated_at)
        .execute(pg)
        .await?;
        Ok(())
    }

    pub async fn delete(pg: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        let done = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(pg)
            .await?;
        Ok(done.rows_affected() >= 1)
    }
}

pub mod sessions {
    use super::*;

    pub async fn find_all(pg: &PgPool) -> sqlx::Result<Vec<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions ORDER BY s_date")
            .fetch_all(pg)
            .await
    }

    pub async fn find_by_group(pg: &PgPool, group_id: Uuid) -> sqlx::Result<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE group_id = $1 ORDER BY s_date",
        )
        .bind(group_id)
        .fetch_all(pg)
        .await
    }

    pub async fn find_scoped(
        pg: &PgPool,
        group_id: Uuid,
        id: Uuid,
    ) -> sqlx::Result<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE id = $1 AND group_id = $2 LIMIT 1",
        )
        .bind(id)
        .bind(group_id)
        .fetch_optional(pg)
        .await
    }

    pub async fn exists(pg: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM sessions WHERE id = $1)")
            .bind(id)
            .fetch_one(pg)
            .await
    }

    pub async fn insert(pg: &PgPool, session: &Session) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO sessions (id, s_date, end_date, comment, group_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(session.id)
        .bind(session.s_date)
        .bind(session.end_date)
        .bind(&session.comment)
        .bind(session.group_id)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(pg)
        .await?;
        Ok(())
    }

    pub async fn update(pg: &PgPool, session: &Session) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE sessions SET s_date = $2, end_date = $3, comment = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(session.id)
        .bind(session.s_date)
        .bind(session.end_date)
        .bind(&session.comment)
        .bind(session.updated_at)
        .execute(pg)
        .await?;
        Ok(())
    }

    pub async fn delete(pg: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        let done = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(pg)
            .await?;
        Ok(done.rows_affected() >= 1)
    }
}

pub mod attendances {
    use super::*;

    /// Session-scoped listing with the student row joined in, the one eager
    /// join in the API.
    pub async fn find_by_session_with_student(
        pg: &PgPool,
        session_id: Uuid,
    ) -> sqlx::Result<Vec<AttendanceWithStudent>> {
        sqlx::query_as::<_, AttendanceWithStudent>(
            "SELECT a.id, a.student_id, a.session_id, a.status, a.created_at, a.updated_at, \
             s.id AS s_id, s.fname AS s_fname, s.name AS s_name, s.email AS s_email, \
             s.group_id AS s_group_id, s.created_at AS s_created_at, s.updated_at AS s_updated_at \
             FROM attendances a JOIN students s ON s.id = a.student_id \
             WHERE a.session_id = $1 ORDER BY a.created_at",
        )
        .bind(session_id)
        .fetch_all(pg)
        .await
    }

    pub async fn find_scoped(
        pg: &PgPool,
        session_id: Uuid,
        id: Uuid,
    ) -> sqlx::Result<Option<Attendance>> {
        sqlx::query_as::<_, Attendance>(
            "SELECT * FROM attendances WHERE id = $1 AND session_id = $2 LIMIT 1",
        )
        .bind(id)
        .bind(session_id)
        .fetch_optional(pg)
        .await
    }

    pub async fn insert(pg: &PgPool, attendance: &Attendance) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO attendances (id, student_id, session_id, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(attendance.id)
        .bind(attendance.student_id)
        .bind(attendance.session_id)
        .bind(&attendance.status)
        .bind(attendance.created_at)
        .bind(attendance.updated_at)
        .execute(pg)
        .await?;
        Ok(())
    }

    pub async fn update(pg: &PgPool, attendance: &Attendance) -> sqlx::Result<()> {
        sqlx::query("UPDATE attendances SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(attendance.id)
            .bind(&attendance.status)
            .bind(attendance.updated_at)
            .execute(pg)
            .await?;
        Ok(())
    }

    pub async fn delete_scoped(pg: &PgPool, session_id: Uuid, id: Uuid) -> sqlx::Result<bool> {
        let done = sqlx::query("DELETE FROM attendances WHERE id = $1 AND session_id = $2")
            .bind(id)
            .bind(session_id)
            .execute(pg)
            .await?;
        Ok(done.rows_affected() >= 1)
    }
}
