//! Static document shapes and trees used across harnesses.
//!
//! Field names and values mirror real feedback records: Hebrew labels in
//! `folder`, `exercise`, `courseType` and `department`, mixed with the English
//! keys the forms emitted.

use serde_json::{json, Value};

/// Instructor-course feedback with three indicator keys.
pub fn scenario_a() -> Value {
    json!({"scores": [4, 5], "instructorName": "X", "folder": "קורס מדריכים"})
}

/// Defense feedback identified only by a misspelled department.
pub fn scenario_b() -> Value {
    json!({"settlement": "Y", "department": "הגנה474"})
}

/// Defense exercise feedback.
pub fn defense_feedback() -> Value {
    json!({
        "instructorName": "Dana",
        "exercise": "מעגל פתוח",
        "settlement": "Y",
        "scores": [3, 4],
        "department": "הגנה 474",
    })
}

/// Feedback that matches no bucket keyword.
pub fn general_feedback() -> Value {
    json!({"rating": 5, "comment": "good session", "name": "Avi"})
}

/// A user profile: one indicator key (`name`), so not feedback.
pub fn user_profile() -> Value {
    json!({"name": "Avi", "email": "avi@example.com", "uid": "u-1"})
}

/// Indicator keys by candidacy count, for threshold cases.
pub const INDICATOR_SETS: &[(&[&str], usize)] = &[
    (&[], 0),
    (&["scores"], 1),
    (&["scores", "instructorName"], 2),
    (&["folder", "exercise", "role"], 3),
    (&["הערות", "notes", "comment", "feedback"], 4),
];

/// A tree with feedback scattered at several depths, next to documents that
/// are not feedback.
///
/// ```text
/// units/u1                           (not feedback)
/// units/u1/feedback/f1               madrichim
/// units/u1/feedback/f1/replies/r1    general
/// units/u2                           (not feedback)
/// units/u2/sessions/s1/rounds/d1     defense474
/// users/a                            (not feedback)
/// users/a/forms/g1                   general
/// ```
pub fn scattered_tree() -> Value {
    json!({
        "units": {
            "u1": {
                "fields": {"title": "north"},
                "collections": {
                    "feedback": {
                        "f1": {
                            "fields": scenario_a(),
                            "collections": {
                                "replies": {"r1": {"fields": general_feedback()}}
                            }
                        }
                    }
                }
            },
            "u2": {
                "fields": {"title": "south"},
                "collections": {
                    "sessions": {
                        "s1": {
                            "fields": {"date": "2024-01-10"},
                            "collections": {
                                "rounds": {"d1": {"fields": defense_feedback()}}
                            }
                        }
                    }
                }
            }
        },
        "users": {
            "a": {
                "fields": user_profile(),
                "collections": {
                    "forms": {"g1": {"fields": general_feedback()}}
                }
            }
        }
    })
}

/// Every document path in [`scattered_tree`], in walk order.
pub const SCATTERED_WALK_ORDER: &[&str] = &[
    "units/u1",
    "units/u1/feedback/f1",
    "units/u1/feedback/f1/replies/r1",
    "units/u2",
    "units/u2/sessions/s1",
    "units/u2/sessions/s1/rounds/d1",
    "users/a",
    "users/a/forms/g1",
];
