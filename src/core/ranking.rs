//! Profile-driven course ranking: direct seed scores, then graph propagation.

use crate::core::graph::CourseGraph;
use crate::core::pagerank::{self, PageRankConfig, PageRankResult};
use crate::core::text::{self, TokenSet};
use crate::domain::model::{
    Course, RankedCourse, ReasonKind, ReasonTag, StudentProfile, WorkloadLevel,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub damping: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub liked_course_weight: f64,
    pub liked_similarity_weight: f64,
    pub interest_weight: f64,
    pub goal_weight: f64,
    pub group_match_weight: f64,
    pub exam_type_weight: f64,
    pub language_bonus: f64,
    pub language_mismatch_factor: f64,
    pub workload_bonus: f64,
    pub workload_penalty_factor: f64,
    /// Multiplier on the final score of courses mentioning an avoided term.
    pub avoid_penalty: f64,
    /// Drop courses taught in a known language other than the preferred one.
    pub strict_language: bool,
    pub max_reason_tags: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iterations: 100,
            liked_course_weight: 3.0,
            liked_similarity_weight: 1.0,
            interest_weight: 2.0,
            goal_weight: 2.0,
            group_match_weight: 0.5,
            exam_type_weight: 0.5,
            language_bonus: 0.5,
            language_mismatch_factor: 0.5,
            workload_bonus: 0.25,
            workload_penalty_factor: 0.6,
            avoid_penalty: 0.5,
            strict_language: false,
            max_reason_tags: 4,
        }
    }
}

impl RankingConfig {
    pub fn pagerank(&self) -> PageRankConfig {
        PageRankConfig {
            damping: self.damping,
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationMode {
    /// Seeded diffusion from profile matches.
    Personalized,
    /// No usable profile signal: plain `PageRank`.
    Centrality,
}

/// Output of one ranking pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub courses: Vec<RankedCourse>,
    /// Final score of every catalogue course, recommended or not.
    pub node_scores: BTreeMap<String, f64>,
    pub mode: PropagationMode,
    pub iterations: usize,
    pub converged: bool,
    /// Engine state the ranking was computed against; 0 outside an engine.
    pub generation: u64,
}

impl Ranking {
    pub fn empty() -> Self {
        Self {
            courses: Vec::new(),
            node_scores: BTreeMap::new(),
            mode: PropagationMode::Centrality,
            iterations: 0,
            converged: true,
            generation: 0,
        }
    }

    pub fn codes(&self) -> Vec<&str> {
        self.courses.iter().map(|c| c.code.as_str()).collect()
    }
}

/// Per-course stage-one result.
#[derive(Debug, Clone, Default)]
struct Seed {
    score: f64,
    tags: Vec<ReasonTag>,
    excluded: bool,
    avoided: bool,
}

struct ProfileSignals {
    liked: BTreeSet<usize>,
    disliked: HashSet<usize>,
    interests: Vec<(String, TokenSet)>,
    goals: Vec<(String, TokenSet)>,
    avoid: TokenSet,
    exam_types: BTreeSet<String>,
    language: Option<String>,
    workload: Option<WorkloadLevel>,
}

impl ProfileSignals {
    fn from_profile(profile: &StudentProfile, graph: &CourseGraph) -> Self {
        let catalogue = graph.catalogue();
        let resolve = |codes: &[String], what: &str| -> Vec<usize> {
            codes
                .iter()
                .map(|c| c.trim())
                .filter_map(|code| {
                    let pos = catalogue.position(code);
                    if pos.is_none() && !code.is_empty() {
                        tracing::debug!("Ignoring unknown {} course code '{}'", what, code);
                    }
                    pos
                })
                .collect()
        };
        // Case-folded and deduplicated: repeating a phrase does not weigh it twice.
        let phrases = |items: &[String]| -> Vec<(String, TokenSet)> {
            items
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect::<BTreeSet<String>>()
                .into_iter()
                .map(|p| {
                    let tokens = text::tokenize(&p);
                    (p, tokens)
                })
                .filter(|(_, tokens)| !tokens.is_empty())
                .collect()
        };

        let avoid = profile
            .avoid
            .iter()
            .flat_map(|p| text::tokenize(p))
            .collect();
        let exam_types = profile
            .preferred_exam_types
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            liked: resolve(&profile.liked_courses, "liked").into_iter().collect(),
            disliked: resolve(&profile.disliked_courses, "disliked")
                .into_iter()
                .collect(),
            interests: phrases(&profile.interests),
            goals: phrases(&profile.goals),
            avoid,
            exam_types,
            language: profile.language(),
            workload: profile.workload(),
        }
    }
}

fn phrase_match<'a>(tokens: &TokenSet, phrases: &'a [(String, TokenSet)]) -> (f64, Vec<&'a str>) {
    let mut total = 0.0;
    let mut matched = Vec::new();
    for (phrase, query) in phrases {
        let sim = text::jaccard(tokens, query);
        if sim > 0.0 {
            total += sim;
            matched.push(phrase.as_str());
        }
    }
    (total, matched)
}

fn seed_for(
    node: usize,
    course: &Course,
    graph: &CourseGraph,
    signals: &ProfileSignals,
    config: &RankingConfig,
) -> Seed {
    let mut seed = Seed::default();

    if signals.disliked.contains(&node) {
        seed.excluded = true;
        return seed;
    }

    let tokens = graph.tokens(node);

    if signals.liked.contains(&node) {
        seed.score += config.liked_course_weight;
        seed.tags.push(ReasonTag::new(
            ReasonKind::LikedCourse,
            course.code.clone(),
            config.liked_course_weight,
        ));
    }

    let mut best_liked: Option<(usize, f64)> = None;
    let mut liked_total = 0.0;
    for &liked in &signals.liked {
        if liked == node {
            continue;
        }
        let sim = text::jaccard(tokens, graph.tokens(liked));
        if sim > 0.0 {
            liked_total += sim;
            if best_liked.is_none_or(|(_, best)| sim > best) {
                best_liked = Some((liked, sim));
            }
        }
    }
    if let Some((liked, _)) = best_liked {
        let contribution = config.liked_similarity_weight * liked_total;
        seed.score += contribution;
        seed.tags.push(ReasonTag::new(
            ReasonKind::LikedNeighbor,
            graph.courses()[liked].code.clone(),
            contribution,
        ));
    }

    let (interest_sim, interests) = phrase_match(tokens, &signals.interests);
    if interest_sim > 0.0 {
        let contribution = config.interest_weight * interest_sim;
        seed.score += contribution;
        seed.tags.push(ReasonTag::new(
            ReasonKind::KeywordMatch,
            interests.join(", "),
            contribution,
        ));
    }

    let (goal_sim, goals) = phrase_match(tokens, &signals.goals);
    if goal_sim > 0.0 {
        let contribution = config.goal_weight * goal_sim;
        seed.score += contribution;
        seed.tags.push(ReasonTag::new(
            ReasonKind::GoalMatch,
            goals.join(", "),
            contribution,
        ));
    }

    let group_tokens = text::tokenize(&course.group);
    let group_hit = signals
        .interests
        .iter()
        .chain(&signals.goals)
        .any(|(_, query)| !query.is_disjoint(&group_tokens));
    if group_hit {
        seed.score += config.group_match_weight;
        seed.tags.push(ReasonTag::new(
            ReasonKind::GroupMatch,
            course.group.clone(),
            config.group_match_weight,
        ));
    }

    if let Some(exam) = course
        .exam_types
        .iter()
        .map(|e| e.trim().to_lowercase())
        .find(|e| signals.exam_types.contains(e))
    {
        seed.score += config.exam_type_weight;
        seed.tags.push(ReasonTag::new(
            ReasonKind::ExamTypeMatch,
            exam,
            config.exam_type_weight,
        ));
    }

    if let Some(language) = &signals.language {
        if course.language == *language {
            seed.score += config.language_bonus;
            seed.tags.push(ReasonTag::new(
                ReasonKind::LanguageMatch,
                language.clone(),
                config.language_bonus,
            ));
        } else if course.has_known_language() {
            if config.strict_language {
                seed.excluded = true;
                return seed;
            }
            let before = seed.score;
            seed.score *= config.language_mismatch_factor;
            seed.tags.push(ReasonTag::new(
                ReasonKind::LanguagePenalty,
                course.language.clone(),
                seed.score - before,
            ));
        }
    }

    if let Some(tolerance) = signals.workload {
        let level = course.workload_level();
        if level <= tolerance {
            seed.score += config.workload_bonus;
            seed.tags.push(ReasonTag::new(
                ReasonKind::WorkloadMatch,
                tolerance.as_str(),
                config.workload_bonus,
            ));
        } else {
            let before = seed.score;
            seed.score *= config.workload_penalty_factor;
            seed.tags.push(ReasonTag::new(
                ReasonKind::WorkloadPenalty,
                level.as_str(),
                seed.score - before,
            ));
        }
    }

    let avoided: Vec<&str> = tokens
        .intersection(&signals.avoid)
        .map(|t| t.as_str())
        .collect();
    if !avoided.is_empty() {
        seed.tags.push(ReasonTag::new(
            ReasonKind::AvoidPenalty,
            avoided.join(", "),
            -seed.score,
        ));
        seed.score = 0.0;
        seed.avoided = true;
    }

    seed.score = seed.score.max(0.0);
    seed
}

/// Ranks the graph's courses for `profile`, computing plain `PageRank` on
/// demand when the profile carries no usable signal.
pub fn rank(
    profile: &StudentProfile,
    graph: &CourseGraph,
    top_k: usize,
    config: &RankingConfig,
) -> Ranking {
    rank_with_centrality(profile, graph, top_k, config, None)
}

/// Like [`rank`], reusing a precomputed global `PageRank` when given.
pub fn rank_with_centrality(
    profile: &StudentProfile,
    graph: &CourseGraph,
    top_k: usize,
    config: &RankingConfig,
    centrality: Option<&PageRankResult>,
) -> Ranking {
    let courses = graph.courses();
    if courses.is_empty() {
        return Ranking::empty();
    }

    let signals = ProfileSignals::from_profile(profile, graph);
    let seeds: Vec<Seed> = courses
        .iter()
        .enumerate()
        .map(|(i, c)| seed_for(i, c, graph, &signals, config))
        .collect();
    let seed_vector: Vec<f64> = seeds.iter().map(|s| s.score).collect();
    let has_signal = seed_vector.iter().any(|&s| s > 0.0);

    let pr_config = config.pagerank();
    let (mode, propagated) = if has_signal {
        (
            PropagationMode::Personalized,
            pagerank::personalized_pagerank(graph, &pr_config, &seed_vector),
        )
    } else {
        let global = match centrality {
            Some(c) if c.scores.len() == courses.len() => c.clone(),
            _ => pagerank::global_pagerank(graph, &pr_config),
        };
        (PropagationMode::Centrality, global)
    };

    tracing::debug!(
        "Propagation ({:?}) finished after {} iterations (converged: {})",
        mode,
        propagated.iterations,
        propagated.converged
    );

    let mut node_scores = BTreeMap::new();
    let mut candidates = Vec::new();
    for (i, course) in courses.iter().enumerate() {
        let seed = &seeds[i];
        let mut score = propagated.scores[i];
        if seed.avoided {
            score *= config.avoid_penalty;
        }
        node_scores.insert(course.code.clone(), score);

        if seed.excluded {
            continue;
        }

        let mut ranked = RankedCourse::from_course(course, score);
        ranked.reason_tags = reason_tags(i, seed, &propagated, mode, graph, config);
        ranked.explanation = Some(explain(&ranked.reason_tags, graph));
        candidates.push((seed.avoided, ranked));
    }

    // Avoided courses trail every course without an avoid signal.
    candidates.sort_by(|(avoided_a, a), (avoided_b, b)| {
        avoided_a
            .cmp(avoided_b)
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| a.code.cmp(&b.code))
    });
    candidates.truncate(top_k.min(courses.len()));

    Ranking {
        courses: candidates.into_iter().map(|(_, ranked)| ranked).collect(),
        node_scores,
        mode,
        iterations: propagated.iterations,
        converged: propagated.converged,
        generation: 0,
    }
}

fn reason_tags(
    node: usize,
    seed: &Seed,
    propagated: &PageRankResult,
    mode: PropagationMode,
    graph: &CourseGraph,
    config: &RankingConfig,
) -> Vec<ReasonTag> {
    let (mut avoid, mut tags): (Vec<ReasonTag>, Vec<ReasonTag>) = seed
        .tags
        .iter()
        .cloned()
        .partition(|t| t.kind == ReasonKind::AvoidPenalty);
    tags.sort_by(|a, b| {
        b.contribution
            .abs()
            .total_cmp(&a.contribution.abs())
            .then_with(|| a.kind.cmp(&b.kind))
    });
    // the avoid tag always survives truncation
    tags.truncate(config.max_reason_tags.saturating_sub(avoid.len()));
    tags.append(&mut avoid);

    match mode {
        PropagationMode::Centrality => {
            tags.push(ReasonTag::new(
                ReasonKind::GraphCentrality,
                graph.degree(node).to_string(),
                propagated.scores[node],
            ));
        }
        PropagationMode::Personalized => {
            let direct = propagated.direct_share(node, config.damping);
            let via_graph = if propagated.scores[node] > 0.0 { 1.0 - direct } else { 0.0 };
            if via_graph > direct {
                let strongest = graph
                    .neighbors(node)
                    .iter()
                    .map(|&(n, w)| (n, w * propagated.scores[n]))
                    .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(&a.0)));
                if let Some((neighbor, _)) = strongest {
                    tags.push(ReasonTag::new(
                        ReasonKind::GraphPropagation,
                        graph.courses()[neighbor].code.clone(),
                        via_graph,
                    ));
                }
            }
        }
    }
    tags
}

fn explain(tags: &[ReasonTag], graph: &CourseGraph) -> String {
    let name_of = |code: &str| {
        graph
            .catalogue()
            .get(code)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| code.to_string())
    };

    let clauses: Vec<String> = tags
        .iter()
        .map(|tag| match tag.kind {
            ReasonKind::LikedCourse => "you liked this course".to_string(),
            ReasonKind::LikedNeighbor => {
                format!("similar to {}, which you liked", name_of(&tag.value))
            }
            ReasonKind::KeywordMatch => format!("matches your interest in {}", tag.value),
            ReasonKind::GoalMatch => format!("supports your goal: {}", tag.value),
            ReasonKind::GroupMatch => format!("belongs to the {} group", tag.value),
            ReasonKind::SectorMatch => format!("shares the {} sector", tag.value),
            ReasonKind::InstructorMatch => format!("taught by {}", tag.value),
            ReasonKind::SemesterMatch => format!("runs in semester {}", tag.value),
            ReasonKind::ExamTypeMatch => format!("assessed by {}, as you prefer", tag.value),
            ReasonKind::LanguageMatch => format!("taught in {}", tag.value),
            ReasonKind::LanguagePenalty => {
                format!("taught in {}, not your preferred language", tag.value)
            }
            ReasonKind::WorkloadMatch => format!("fits your {} workload tolerance", tag.value),
            ReasonKind::WorkloadPenalty => {
                format!("has a {} workload, above your tolerance", tag.value)
            }
            ReasonKind::AvoidPenalty => {
                format!("mentions {}, which you want to avoid", tag.value)
            }
            ReasonKind::GraphPropagation => {
                format!("closely related to {}", name_of(&tag.value))
            }
            ReasonKind::GraphCentrality => "a well-connected course in the catalogue".to_string(),
        })
        .collect();
    if clauses.is_empty() {
        return "No direct match with your profile; included to fill the list.".to_string();
    }

    let mut sentence = clauses.join("; ");
    if let Some(first) = sentence.get(..1) {
        let upper = first.to_uppercase();
        sentence.replace_range(..1, &upper);
    }
    sentence.push('.');
    sentence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalogue::tests::course;
    use crate::core::catalogue::Catalogue;
    use crate::core::graph::{build_graph, GraphBuildConfig};

    fn path_graph() -> CourseGraph {
        let catalogue = Catalogue::new(vec![
            course("A", "Quantum Computing", "PHYSICS"),
            course("B", "Linear Algebra", "MATH"),
            course("C", "Painting", "ARTS"),
        ])
        .unwrap();
        CourseGraph::from_edges(
            catalogue,
            &[
                ("A".to_string(), "B".to_string(), 0.5),
                ("B".to_string(), "C".to_string(), 0.3),
            ],
        )
        .unwrap()
    }

    fn profile(json: &str) -> StudentProfile {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_seeded_course_outranks_its_neighbours() {
        let ranking = rank(
            &profile(r#"{"interests": ["quantum computing"]}"#),
            &path_graph(),
            3,
            &RankingConfig::default(),
        );
        assert_eq!(ranking.mode, PropagationMode::Personalized);
        assert_eq!(ranking.codes(), vec!["A", "B", "C"]);
        assert!(ranking.courses[0].has_reason(ReasonKind::KeywordMatch));
        assert!(ranking.courses[1].has_reason(ReasonKind::GraphPropagation));
    }

    #[test]
    fn test_empty_profile_uses_centrality() {
        let ranking = rank(&StudentProfile::default(), &path_graph(), 3, &RankingConfig::default());
        assert_eq!(ranking.mode, PropagationMode::Centrality);
        assert_eq!(ranking.codes()[0], "B");
        assert!(ranking.courses.iter().all(|c| c.has_reason(ReasonKind::GraphCentrality)));
    }

    #[test]
    fn test_disliked_course_is_excluded() {
        let ranking = rank(
            &profile(r#"{"interests": ["quantum computing"], "disliked_courses": ["A", "NOPE"]}"#),
            &path_graph(),
            3,
            &RankingConfig::default(),
        );
        assert!(!ranking.codes().contains(&"A"));
        assert_eq!(ranking.courses.len(), 2);
        assert!(ranking.node_scores.contains_key("A"));
    }

    #[test]
    fn test_avoided_course_is_penalised() {
        let graph = path_graph();
        let config = RankingConfig::default();
        let plain = rank(&profile(r#"{"interests": ["algebra"]}"#), &graph, 3, &config);
        let avoiding = rank(
            &profile(r#"{"interests": ["algebra"], "avoid": ["painting"]}"#),
            &graph,
            3,
            &config,
        );

        let c_plain = plain.node_scores["C"];
        let c_avoid = avoiding.node_scores["C"];
        assert!(c_avoid < c_plain);
        let c = avoiding.courses.iter().find(|c| c.code == "C").unwrap();
        assert!(c.has_reason(ReasonKind::AvoidPenalty));
    }

    #[test]
    fn test_avoided_course_trails_unflagged_courses() {
        let catalogue = Catalogue::new(vec![
            course("A", "Quantum Computing", "PHYSICS"),
            course("B", "Quantum Optics", "PHYSICS"),
            course("C", "Painting", "ARTS"),
        ])
        .unwrap();
        let graph = CourseGraph::from_edges(
            catalogue,
            &[
                ("A".to_string(), "B".to_string(), 1.0),
                ("A".to_string(), "C".to_string(), 0.2),
            ],
        )
        .unwrap();

        let ranking = rank(
            &profile(r#"{"interests": ["computing"], "avoid": ["optics"]}"#),
            &graph,
            3,
            &RankingConfig::default(),
        );
        assert_eq!(ranking.codes(), vec!["A", "C", "B"]);
        assert!(ranking.courses[2].has_reason(ReasonKind::AvoidPenalty));
        assert!(ranking.node_scores["B"] > ranking.node_scores["C"]);
    }

    #[test]
    fn test_avoid_tag_survives_tag_limit() {
        let config = RankingConfig {
            max_reason_tags: 1,
            ..RankingConfig::default()
        };
        let ranking = rank(
            &profile(r#"{"interests": ["algebra"], "avoid": ["painting"]}"#),
            &path_graph(),
            3,
            &config,
        );
        let c = ranking.courses.iter().find(|c| c.code == "C").unwrap();
        assert!(c.has_reason(ReasonKind::AvoidPenalty));
    }

    #[test]
    fn test_repeated_phrases_count_once() {
        let graph = path_graph();
        let config = RankingConfig::default();
        let once = rank(
            &profile(r#"{"interests": ["quantum computing", "painting"]}"#),
            &graph,
            3,
            &config,
        );
        let repeated = rank(
            &profile(r#"{"interests": ["Quantum Computing", "quantum computing ", "painting"]}"#),
            &graph,
            3,
            &config,
        );
        assert_eq!(once, repeated);
    }

    #[test]
    fn test_language_preference() {
        let mut it = course("IT1", "Reti di calcolatori", "SYSTEMS");
        it.language = "IT".to_string();
        let en = course("EN1", "Computer networks", "SYSTEMS");
        let graph = build_graph(Catalogue::new(vec![it, en]).unwrap(), &GraphBuildConfig::default());

        let soft = rank(
            &profile(r#"{"language_preference": "it"}"#),
            &graph,
            2,
            &RankingConfig::default(),
        );
        assert_eq!(soft.codes(), vec!["IT1", "EN1"]);

        let strict = rank(
            &profile(r#"{"language_preference": "IT"}"#),
            &graph,
            2,
            &RankingConfig {
                strict_language: true,
                ..RankingConfig::default()
            },
        );
        assert_eq!(strict.codes(), vec!["IT1"]);
    }

    #[test]
    fn test_workload_tolerance() {
        let mut heavy = course("H", "Compilers", "SYSTEMS");
        heavy.cfu = 12.0;
        let light = course("L", "Compilers seminar", "SYSTEMS");
        let graph =
            build_graph(Catalogue::new(vec![heavy, light]).unwrap(), &GraphBuildConfig::default());

        let ranking = rank(
            &profile(r#"{"interests": ["compilers"], "workload_tolerance": "low"}"#),
            &graph,
            2,
            &RankingConfig::default(),
        );
        assert_eq!(ranking.codes()[0], "L");
        assert!(ranking.courses[1].has_reason(ReasonKind::WorkloadPenalty));
    }

    #[test]
    fn test_top_k_is_clipped() {
        let ranking = rank(&StudentProfile::default(), &path_graph(), 50, &RankingConfig::default());
        assert_eq!(ranking.courses.len(), 3);
        let none = rank(&StudentProfile::default(), &path_graph(), 0, &RankingConfig::default());
        assert!(none.courses.is_empty());
    }

    #[test]
    fn test_empty_catalogue() {
        let graph = CourseGraph::from_edges(Catalogue::default(), &[]).unwrap();
        let ranking = rank(
            &profile(r#"{"interests": ["anything"]}"#),
            &graph,
            5,
            &RankingConfig::default(),
        );
        assert!(ranking.courses.is_empty());
    }

    #[test]
    fn test_explanation_reads_as_sentence() {
        let ranking = rank(
            &profile(r#"{"interests": ["quantum computing"]}"#),
            &path_graph(),
            1,
            &RankingConfig::default(),
        );
        let explanation = ranking.courses[0].explanation.as_deref().unwrap();
        assert!(explanation.starts_with("Matches your interest in quantum computing"));
        assert!(explanation.ends_with('.'));
    }
}
