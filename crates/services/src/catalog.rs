//! Read-only course catalog, materialized per locale.

use chrono::{DateTime, NaiveDate, Utc};
use tutor_core::model::{
    Attempt, AttemptId, Course, CourseCategory, CourseId, ExamResults, Exercise, ExerciseId,
    ExerciseKind, LeaderboardEntry, Lesson, LessonId, Locale, Progress, ProgressPatch, Quiz,
    QuizId, QuizKind, QuizQuestion, Role, User, UserId,
};

use crate::error::CatalogError;

/// Fully materialized catalog for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub locale: Locale,
    pub courses: Vec<Course>,
    pub featured_courses: Vec<Course>,
    pub user: User,
    pub progress_records: Vec<Progress>,
    pub attempts: Vec<Attempt>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Source of catalog content.
///
/// Implementations must be deterministic: the same locale yields the same catalog.
pub trait CatalogProvider: Send + Sync {
    /// Build the catalog localized for `locale`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the content fails validation.
    fn catalog(&self, locale: Locale) -> Result<Catalog, CatalogError>;
}

//
// ─── GENERATED CATALOG ─────────────────────────────────────────────────────────
//

const SOURCE_POOL: [&str; 5] = [
    "MDN Web Docs",
    "Khan Academy",
    "MIT OpenCourseWare",
    "Wikipedia (API)",
    "FreeCodeCamp",
];

const FEATURED_COUNT: usize = 6;
const ENROLLED_COUNT: usize = 6;
const LAST_STUDIED: (i32, u32, u32) = (2026, 2, 8);

struct CourseDefinition {
    title: &'static str,
    category: CourseCategory,
    level: &'static str,
    description: &'static str,
    tags: &'static [&'static str],
}

const COURSES: &[CourseDefinition] = &[
    CourseDefinition {
        title: "Python basics",
        category: CourseCategory::Programming,
        level: "Beginner",
        description: "Learn Python syntax, data types, and the building blocks for automation and data work.",
        tags: &["Python", "Beginner", "Automation"],
    },
    CourseDefinition {
        title: "SQL basics",
        category: CourseCategory::Programming,
        level: "Beginner",
        description: "Write queries, filter data, and understand relational database thinking.",
        tags: &["SQL", "Data", "Databases"],
    },
    CourseDefinition {
        title: "PostgreSQL",
        category: CourseCategory::Programming,
        level: "Intermediate",
        description: "Model data, optimize queries, and explore PostgreSQL features used in production.",
        tags: &["PostgreSQL", "Indexes", "Performance"],
    },
    CourseDefinition {
        title: "HTML/CSS",
        category: CourseCategory::Programming,
        level: "Beginner",
        description: "Craft accessible layouts, responsive pages, and modern styling foundations.",
        tags: &["HTML", "CSS", "Responsive"],
    },
    CourseDefinition {
        title: "JavaScript",
        category: CourseCategory::Programming,
        level: "Beginner",
        description: "Understand JavaScript fundamentals, the DOM, and async programming.",
        tags: &["JavaScript", "Frontend", "DOM"],
    },
    CourseDefinition {
        title: "English A1–B2",
        category: CourseCategory::Languages,
        level: "Beginner to Intermediate",
        description: "Structured English learning path from fundamentals to independent communication.",
        tags: &["English", "A1", "B2"],
    },
    CourseDefinition {
        title: "Russian beginner",
        category: CourseCategory::Languages,
        level: "Beginner",
        description: "Learn Cyrillic, survival phrases, and essential grammar for Russian learners.",
        tags: &["Russian", "Beginner", "Grammar"],
    },
    CourseDefinition {
        title: "Math",
        category: CourseCategory::SchoolSubjects,
        level: "Core",
        description: "Arithmetic, algebra, geometry, and trigonometry with practice-focused guidance.",
        tags: &["Math", "Algebra", "Geometry"],
    },
    CourseDefinition {
        title: "Chemistry",
        category: CourseCategory::SchoolSubjects,
        level: "Core",
        description: "Explore atoms, reactions, and lab reasoning with structured explanations.",
        tags: &["Chemistry", "Lab", "Reactions"],
    },
    CourseDefinition {
        title: "Biology",
        category: CourseCategory::SchoolSubjects,
        level: "Core",
        description: "Understand cells, ecosystems, and human systems with guided practice.",
        tags: &["Biology", "Cells", "Systems"],
    },
];

fn lesson_themes(category: CourseCategory, locale: Locale) -> [&'static str; 5] {
    match (category, locale) {
        (CourseCategory::Programming, Locale::En) => [
            "Foundations & tooling",
            "Core syntax patterns",
            "Data structures & flow",
            "Working with real data",
            "Mini project walkthrough",
        ],
        (CourseCategory::Programming, Locale::Ru) => [
            "Основы и инструменты",
            "Базовые синтаксические приёмы",
            "Структуры данных и поток выполнения",
            "Работа с реальными данными",
            "Разбор мини-проекта",
        ],
        (CourseCategory::Programming, Locale::Uz) => [
            "Asoslar va vositalar",
            "Asosiy sintaksis namunalari",
            "Ma'lumotlar tuzilmalari va oqim",
            "Haqiqiy ma'lumotlar bilan ishlash",
            "Mini loyiha tahlili",
        ],
        (CourseCategory::Languages, Locale::En) => [
            "Sounds & essential phrases",
            "Everyday conversations",
            "Grammar building blocks",
            "Listening and reading practice",
            "Speaking confidence drills",
        ],
        (CourseCategory::Languages, Locale::Ru) => [
            "Звуки и базовые фразы",
            "Повседневные диалоги",
            "Основы грамматики",
            "Практика аудирования и чтения",
            "Упражнения для уверенной речи",
        ],
        (CourseCategory::Languages, Locale::Uz) => [
            "Tovushlar va asosiy iboralar",
            "Kundalik suhbatlar",
            "Grammatika asoslari",
            "Tinglash va o'qish mashqlari",
            "Nutq ishonchi mashqlari",
        ],
        (CourseCategory::SchoolSubjects, Locale::En) => [
            "Conceptual overview",
            "Key formulas & facts",
            "Worked examples",
            "Practice set",
            "Checkpoint review",
        ],
        (CourseCategory::SchoolSubjects, Locale::Ru) => [
            "Обзор понятий",
            "Ключевые формулы и факты",
            "Разобранные примеры",
            "Набор упражнений",
            "Контрольное повторение",
        ],
        (CourseCategory::SchoolSubjects, Locale::Uz) => [
            "Tushunchalar sharhi",
            "Asosiy formulalar va faktlar",
            "Ishlangan misollar",
            "Mashqlar to'plami",
            "Nazorat takrori",
        ],
    }
}

/// Lowercase ASCII slug with runs of other characters collapsed to `-`.
fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn midnight(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

/// Deterministic catalog generated from course definitions and lesson themes.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratedCatalog;

impl GeneratedCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn build_lesson(
        course_id: &CourseId,
        course_title: &str,
        theme: &str,
        index: usize,
    ) -> Result<Lesson, CatalogError> {
        let lesson_id = LessonId::new(format!("{course_id}-lesson-{}", index + 1));
        let source = SOURCE_POOL[index % SOURCE_POOL.len()];
        let theme_lower = theme.to_lowercase();

        let exercises = vec![
            Exercise {
                id: ExerciseId::new(format!("{lesson_id}-ex-1")),
                prompt: format!("Summarize the key idea from {theme_lower} in 2 sentences."),
                kind: ExerciseKind::ShortAnswer,
                hint: Some("Use the lesson summary as your outline.".into()),
            },
            Exercise {
                id: ExerciseId::new(format!("{lesson_id}-ex-2")),
                prompt: format!("List three real-life scenarios where {course_title} matters."),
                kind: ExerciseKind::ShortAnswer,
                hint: Some("Think projects, exams, or workplace tasks.".into()),
            },
            Exercise {
                id: ExerciseId::new(format!("{lesson_id}-ex-3")),
                prompt: format!("Solve a practice prompt related to {theme_lower}."),
                kind: ExerciseKind::Practice,
                hint: Some("Follow the worked examples from this lesson.".into()),
            },
        ];

        let questions = vec![
            QuizQuestion::new(
                format!("{lesson_id}-q1"),
                format!("Which statement best captures the focus of {theme_lower}?"),
                strings(&[
                    "It is mainly about memorization only.",
                    "It connects core concepts to practical usage.",
                    "It avoids real-world examples.",
                    "It is optional for mastering the course.",
                ]),
                1,
                "The theme connects foundational ideas with practical usage.",
            )?,
            QuizQuestion::new(
                format!("{lesson_id}-q2"),
                "What is a productive next step after this lesson?",
                strings(&[
                    "Skip practice tasks.",
                    "Complete at least one exercise and review feedback.",
                    "Wait until the final exam.",
                    "Ignore the examples.",
                ]),
                1,
                "Practice cements the concepts and reveals gaps early.",
            )?,
            QuizQuestion::new(
                format!("{lesson_id}-q3"),
                "Which resource style supports this lesson?",
                strings(&[
                    "Short, structured explanations with practice.",
                    "Only long-form lectures.",
                    "Only memorization drills.",
                    "No external references.",
                ]),
                0,
                "The lesson blends structured explanations and practice.",
            )?,
        ];

        Ok(Lesson {
            id: lesson_id.clone(),
            course_id: course_id.clone(),
            title: format!("{course_title}: {theme}"),
            summary: format!("A structured walkthrough of {theme_lower} for {course_title}."),
            duration_minutes: 18 + u32::try_from(index).unwrap_or(0) * 4,
            theory: vec![
                format!("Learning focus: {theme_lower} in the context of {course_title}."),
                "We introduce the key terms, then connect them to real-world practice.".into(),
                "Use the short checks to ensure you can explain concepts in your own words.".into(),
                "Think about how this topic appears in daily tasks, projects, or tests.".into(),
                format!("This lesson is adapted from neutral educational references like {source}."),
            ],
            examples: vec![
                format!("Worked example 1: A guided scenario tailored for {course_title}."),
                "Worked example 2: A common pitfall and how to resolve it.".into(),
                "Worked example 3: Translating the concept into a practical task.".into(),
            ],
            exercises,
            quiz: Quiz {
                id: QuizId::new(format!("{lesson_id}-quiz")),
                title: format!("{course_title} quick check"),
                kind: QuizKind::LessonReview,
                questions,
            },
            sources: vec![
                source.to_string(),
                SOURCE_POOL[(index + 2) % SOURCE_POOL.len()].to_string(),
            ],
        })
    }

    fn build_exam(course_id: &CourseId, course_title: &str, kind: QuizKind) -> Result<Quiz, CatalogError> {
        let (slug, label) = match kind {
            QuizKind::MidCourse => ("mid-course", "mid-course exam"),
            _ => ("final", "final exam"),
        };
        let questions = vec![
            QuizQuestion::new(
                format!("{course_id}-{slug}-q1"),
                format!("What is the main outcome expected by the {slug} exam?"),
                strings(&[
                    "Recall isolated facts only.",
                    "Demonstrate structured understanding and applied skills.",
                    "Skip practice and rely on guessing.",
                    "Avoid reviewing earlier lessons.",
                ]),
                1,
                "Exams measure both understanding and the ability to apply skills.",
            )?,
            QuizQuestion::new(
                format!("{course_id}-{slug}-q2"),
                "Which preparation strategy best supports success?",
                strings(&[
                    "Review lesson summaries and complete practice tasks.",
                    "Ignore feedback and move forward quickly.",
                    "Avoid quizzes to save time.",
                    "Study only the last lesson.",
                ]),
                0,
                "Steady review and practice deliver the strongest results.",
            )?,
        ];
        Ok(Quiz {
            id: QuizId::new(format!("{course_id}-{slug}-exam")),
            title: format!("{course_title} {label}"),
            kind,
            questions,
        })
    }

    fn build_course(def: &CourseDefinition, locale: Locale) -> Result<Course, CatalogError> {
        let id = CourseId::new(slugify(def.title));
        let lessons = lesson_themes(def.category, locale)
            .iter()
            .enumerate()
            .map(|(index, theme)| Self::build_lesson(&id, def.title, theme, index))
            .collect::<Result<Vec<_>, _>>()?;
        let minutes: u32 = lessons.iter().map(|l| l.duration_minutes).sum();

        Ok(Course {
            mid_course_exam: Self::build_exam(&id, def.title, QuizKind::MidCourse)?,
            final_exam: Self::build_exam(&id, def.title, QuizKind::Final)?,
            id,
            title: def.title.to_string(),
            category: def.category,
            level: def.level.to_string(),
            description: def.description.to_string(),
            tags: strings(def.tags),
            total_lessons: u32::try_from(lessons.len()).unwrap_or(u32::MAX),
            estimated_hours: (f64::from(minutes) / 60.0).round() as u32,
            lessons,
        })
    }

    fn seed_user(courses: &[Course]) -> User {
        User {
            id: UserId::new("user-001"),
            name: "Abubakr Hassan".into(),
            email: "abubakr@skynetic.ai".into(),
            role: Role::Learner,
            enrolled_course_ids: courses
                .iter()
                .take(ENROLLED_COUNT)
                .map(|c| c.id.clone())
                .collect(),
            badges: strings(&["Consistency Builder", "Fast Starter", "Curious Mind"]),
            rank: 18,
            streak_days: 12,
            avatar_color: "#0F766E".into(),
        }
    }

    fn seed_progress(user: &User, courses: &[Course]) -> Vec<Progress> {
        let (year, month, day) = LAST_STUDIED;
        user.enrolled_course_ids
            .iter()
            .enumerate()
            .map(|(index, course_id)| {
                let index_u32 = u32::try_from(index).unwrap_or(0);
                let course = courses.iter().find(|c| &c.id == course_id);
                let completed: Vec<LessonId> = course
                    .map(|c| {
                        c.lessons
                            .iter()
                            .take(2 + index % 3)
                            .map(|l| l.id.clone())
                            .collect()
                    })
                    .unwrap_or_default();
                let next = course.and_then(|c| {
                    c.lessons
                        .get(completed.len())
                        .or_else(|| c.lessons.first())
                        .map(|l| l.id.clone())
                });

                let mut record = Progress::new(user.id.clone(), course_id.clone());
                let mut patch = ProgressPatch::new()
                    .completed_lessons(completed)
                    .average_score(78 + (index_u32 % 4) * 4)
                    .exam_results(ExamResults {
                        lesson_review: 82 + (index_u32 % 3) * 3,
                        mid_course: 74 + (index_u32 % 3) * 4,
                        final_exam: 88 - (index_u32 % 2) * 5,
                    });
                if let Some(day) = NaiveDate::from_ymd_opt(year, month, day) {
                    patch = patch.last_studied_at(day);
                }
                if let Some(next) = next {
                    patch = patch.next_lesson(next);
                }
                record.apply_patch(patch);
                record
            })
            .collect()
    }

    fn seed_attempts(progress: &[Progress]) -> Vec<Attempt> {
        progress
            .iter()
            .flat_map(|record| {
                let results = record.exam_results;
                [
                    ("lesson-review", "lesson-review", results.lesson_review, 7),
                    ("mid-course", "mid-course", results.mid_course, 8),
                    ("final-exam", "final", results.final_exam, 9),
                ]
                .map(|(suffix, quiz, score, day)| {
                    Attempt::new(
                        AttemptId::new(format!("{}-{suffix}", record.id)),
                        QuizId::new(format!("{}-{quiz}", record.course_id)),
                        score,
                        100,
                        midnight(2026, 2, day),
                    )
                })
            })
            .collect()
    }

    fn leaderboard() -> Vec<LeaderboardEntry> {
        [
            ("lb-1", "Maya", 1840),
            ("lb-2", "Rafael", 1725),
            ("lb-3", "You", 1680),
            ("lb-4", "Lina", 1600),
            ("lb-5", "Jon", 1540),
        ]
        .into_iter()
        .map(|(id, name, points)| LeaderboardEntry {
            id: id.to_string(),
            name: name.to_string(),
            points,
        })
        .collect()
    }
}

impl CatalogProvider for GeneratedCatalog {
    fn catalog(&self, locale: Locale) -> Result<Catalog, CatalogError> {
        let courses = COURSES
            .iter()
            .map(|def| Self::build_course(def, locale))
            .collect::<Result<Vec<_>, _>>()?;
        let user = Self::seed_user(&courses);
        let progress_records = Self::seed_progress(&user, &courses);
        let attempts = Self::seed_attempts(&progress_records);

        Ok(Catalog {
            locale,
            featured_courses: courses.iter().take(FEATURED_COUNT).cloned().collect(),
            courses,
            user,
            progress_records,
            attempts,
            leaderboard: Self::leaderboard(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Python basics"), "python-basics");
        assert_eq!(slugify("HTML/CSS"), "html-css");
        assert_eq!(slugify("English A1–B2"), "english-a1-b2");
        assert_eq!(slugify("  trailing!! "), "trailing");
    }

    #[test]
    fn generated_catalog_shapes_courses() {
        let catalog = GeneratedCatalog::new().catalog(Locale::En).unwrap();
        let python = &catalog.courses[0];

        assert_eq!(python.id.as_str(), "python-basics");
        assert_eq!(python.lessons.len(), 5);
        assert_eq!(python.total_lessons, 5);
        assert_eq!(python.estimated_hours, 2);
        assert_eq!(python.lessons[0].id.as_str(), "python-basics-lesson-1");
        assert_eq!(python.lessons[0].quiz.id.as_str(), "python-basics-lesson-1-quiz");
        assert_eq!(python.lessons[0].exercises.len(), 3);
        assert_eq!(python.mid_course_exam.id.as_str(), "python-basics-mid-course-exam");
        assert_eq!(catalog.featured_courses.len(), FEATURED_COUNT);
    }

    #[test]
    fn seeded_progress_matches_enrollment() {
        let catalog = GeneratedCatalog::new().catalog(Locale::En).unwrap();

        assert_eq!(catalog.progress_records.len(), ENROLLED_COUNT);
        let first = &catalog.progress_records[0];
        assert_eq!(first.completed_lesson_ids().len(), 2);
        assert_eq!(first.average_score, 78);
        assert_eq!(
            first.next_lesson_id.as_ref().map(LessonId::as_str),
            Some("python-basics-lesson-3")
        );
        let third = &catalog.progress_records[2];
        assert_eq!(third.completed_lesson_ids().len(), 4);
        assert_eq!(third.average_score, 86);

        assert_eq!(catalog.attempts.len(), ENROLLED_COUNT * 3);
        assert_eq!(catalog.attempts[0].id.as_str(), "progress-python-basics-lesson-review");
    }

    #[test]
    fn locale_changes_lesson_titles_but_not_ids() {
        let provider = GeneratedCatalog::new();
        let en = provider.catalog(Locale::En).unwrap();
        let ru = provider.catalog(Locale::Ru).unwrap();

        assert_eq!(en.courses[0].lessons[0].id, ru.courses[0].lessons[0].id);
        assert_ne!(en.courses[0].lessons[0].title, ru.courses[0].lessons[0].title);
        assert_eq!(ru.locale, Locale::Ru);
    }

    #[test]
    fn catalog_is_deterministic() {
        let provider = GeneratedCatalog::new();
        assert_eq!(provider.catalog(Locale::Uz).unwrap(), provider.catalog(Locale::Uz).unwrap());
    }
}
