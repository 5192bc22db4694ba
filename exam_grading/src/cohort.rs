use std::collections::{BTreeMap, HashMap};

use log::{debug, info};

use crate::config::*;
use crate::table::is_missing_marker;

/// The name of the group used when aggregating all the students together.
pub const OVERALL_GROUP: &str = "All students";

/// A short appreciation of a percentage.
pub fn status_label(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "Excellent"
    } else if percentage >= 80.0 {
        "Very good"
    } else if percentage >= 70.0 {
        "Good"
    } else if percentage >= 60.0 {
        "Fair"
    } else {
        "Needs improvement"
    }
}

/// The bucket a student belongs to. Blank, `nan`-like and placeholder group
/// values all go to the ungrouped bucket.
pub fn canonical_group(group: &str, placeholders: &Placeholders) -> String {
    let g = group.trim();
    if g.is_empty() || is_missing_marker(g) || g == placeholders.group.trim() {
        placeholders.ungrouped.clone()
    } else {
        g.to_string()
    }
}

/// Partitions the students by group, keeping the order of the records inside
/// each group.
pub fn group_by_cohort(
    records: &[StudentRecord],
    placeholders: &Placeholders,
) -> BTreeMap<String, Vec<StudentRecord>> {
    let mut res: BTreeMap<String, Vec<StudentRecord>> = BTreeMap::new();
    for r in records.iter() {
        res.entry(canonical_group(&r.group, placeholders))
            .or_default()
            .push(r.clone());
    }
    res
}

/// Computes the statistics of one group. Returns `None` for an empty group.
pub fn group_aggregate(
    name: &str,
    members: Vec<StudentRecord>,
    passing_percentage: f64,
) -> Option<GroupAggregate> {
    let first = members.first()?;
    let n = members.len() as f64;

    // Ties keep the first student encountered.
    let mut best = first;
    let mut worst = first;
    let mut distribution = ScoreDistribution::default();
    for m in members.iter() {
        if m.percentage() > best.percentage() {
            best = m;
        }
        if m.percentage() < worst.percentage() {
            worst = m;
        }
        distribution.record(m.percentage());
    }

    let mean_percentage = round2(members.iter().map(|m| m.percentage()).sum::<f64>() / n);
    let mean_score = round2(members.iter().map(|m| m.score()).sum::<f64>() / n);
    let mean_correct = round2(members.iter().map(|m| m.total_correct() as f64).sum::<f64>() / n);

    let subjects: Vec<SubjectStats> = first
        .subjects
        .iter()
        .map(|s| subject_stats(&s.subject, s.total, &members, passing_percentage))
        .collect();

    let total_questions = first.total_questions();
    let best = highlight(best);
    let worst = highlight(worst);

    debug!(
        "group_aggregate: group {:?}: {} students, mean {}%",
        name,
        members.len(),
        mean_percentage
    );

    Some(GroupAggregate {
        name: name.to_string(),
        members,
        total_questions,
        mean_percentage,
        mean_score,
        mean_correct,
        max_percentage: best.percentage,
        min_percentage: worst.percentage,
        best,
        worst,
        distribution,
        subjects,
    })
}

fn highlight(r: &StudentRecord) -> StudentHighlight {
    StudentHighlight {
        name: r.name.clone(),
        percentage: r.percentage(),
        correct: r.total_correct(),
    }
}

fn subject_stats(
    subject: &str,
    total_questions: usize,
    members: &[StudentRecord],
    passing_percentage: f64,
) -> SubjectStats {
    let results: Vec<&SubjectResult> = members.iter().filter_map(|m| m.subject(subject)).collect();
    let n = results.len();
    let corrects: Vec<usize> = results.iter().map(|r| r.correct.len()).collect();
    let (mean_percentage, mean_correct) = if n == 0 {
        (0.0, 0.0)
    } else {
        (
            round2(results.iter().map(|r| r.percentage).sum::<f64>() / n as f64),
            round2(corrects.iter().sum::<usize>() as f64 / n as f64),
        )
    };
    // A subject without questions has no perfect or passing students.
    let (perfect_count, passing_count) = if total_questions == 0 {
        (0, 0)
    } else {
        (
            corrects.iter().filter(|c| **c == total_questions).count(),
            results
                .iter()
                .filter(|r| r.percentage >= passing_percentage)
                .count(),
        )
    };
    SubjectStats {
        subject: subject.to_string(),
        total_questions,
        mean_percentage,
        mean_correct,
        max_correct: corrects.iter().max().cloned().unwrap_or(0),
        min_correct: corrects.iter().min().cloned().unwrap_or(0),
        perfect_count,
        passing_count,
    }
}

/// Ranks the questions from the most missed to the least missed.
/// Questions that nobody missed are not listed.
pub fn question_difficulty(records: &[StudentRecord]) -> Vec<QuestionDifficulty> {
    let mut misses: HashMap<QuestionIndex, usize> = HashMap::new();
    for r in records.iter() {
        for q in r.incorrect.iter() {
            *misses.entry(*q).or_insert(0) += 1;
        }
    }
    let students = records.len();
    let mut res: Vec<QuestionDifficulty> = misses
        .into_iter()
        .map(|(question, count)| QuestionDifficulty {
            question,
            misses: count,
            students,
            error_rate: count as f64 / students as f64,
        })
        .collect();
    res.sort_by(|a, b| b.misses.cmp(&a.misses).then(a.question.cmp(&b.question)));
    res
}

/// Computes the statistics of all the students, of every group, and the
/// question difficulty ranking.
pub fn aggregate_cohorts(
    records: &[StudentRecord],
    rules: &GradingRules,
) -> Result<CohortReport, GradingErrors> {
    let overall = group_aggregate(OVERALL_GROUP, records.to_vec(), rules.passing_percentage)
        .ok_or(GradingErrors::NoStudents)?;

    let mut groups: Vec<GroupAggregate> = Vec::new();
    for (name, members) in group_by_cohort(records, &rules.placeholders) {
        if let Some(g) = group_aggregate(&name, members, rules.passing_percentage) {
            groups.push(g);
        }
    }
    info!(
        "aggregate_cohorts: {} students in {} groups",
        records.len(),
        groups.len()
    );

    Ok(CohortReport {
        overall,
        groups,
        difficulty: question_difficulty(records),
    })
}
