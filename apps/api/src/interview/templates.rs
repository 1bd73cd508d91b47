//! Template question generator: deterministic, offline question/answer pairs built from
//! the technologies a job description mentions.
//!
//! Used to backfill the pipeline when the LLM output is missing or off-topic. Never calls
//! the LLM and never fails.

use crate::models::question::QuestionDraft;

/// Ordered dictionary of substrings to look for, and the label used in questions.
/// Matching order is dictionary order, not order of appearance in the text.
pub const TECH_KEYWORDS: [(&str, &str); 27] = [
    ("python", "Python programming"),
    ("javascript", "JavaScript"),
    ("react", "React.js"),
    ("node", "Node.js"),
    ("api", "API development"),
    ("rest", "RESTful services"),
    ("database", "database design"),
    ("sql", "SQL"),
    ("nosql", "NoSQL databases"),
    ("mongodb", "MongoDB"),
    ("aws", "AWS"),
    ("azure", "Azure"),
    ("cloud", "cloud services"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
    ("microservice", "microservices architecture"),
    ("agile", "Agile methodologies"),
    ("scrum", "Scrum"),
    ("test", "testing strategies"),
    ("ci/cd", "CI/CD pipelines"),
    ("git", "Git"),
    ("frontend", "frontend development"),
    ("backend", "backend development"),
    ("fullstack", "full-stack development"),
    ("mobile", "mobile development"),
    ("security", "security practices"),
    ("performance", "performance optimization"),
];

/// Used when no dictionary entry matches.
pub const DEFAULT_KEYWORDS: [&str; 5] = [
    "programming",
    "development",
    "software engineering",
    "teamwork",
    "problem-solving",
];

const PLACEHOLDER: &str = "{keyword}";

struct Template {
    question: &'static str,
    answer: &'static str,
}

const TEMPLATES: [Template; 5] = [
    Template {
        question: "What experience do you have with {keyword} and how have you applied it in your previous roles?",
        answer: "A strong answer would demonstrate practical experience with {keyword}, including specific projects, challenges overcome, and measurable results achieved. The candidate should show both technical understanding and practical application of {keyword} in relevant contexts.",
    },
    Template {
        question: "Describe a challenging project where you used {keyword}. What problems did you encounter and how did you solve them?",
        answer: "The candidate should describe a specific project involving {keyword}, clearly articulating the challenges faced and the solutions implemented. A good answer would include technical details, problem-solving approach, and the outcome of the project.",
    },
    Template {
        question: "How do you stay current with developments in {keyword}?",
        answer: "A good answer would mention specific learning resources, communities, or practices the candidate uses to stay updated with {keyword}. This might include following relevant blogs, participating in forums, attending conferences, or contributing to open-source projects.",
    },
    Template {
        question: "How would you implement {keyword} in a new project? What best practices would you follow?",
        answer: "The candidate should demonstrate knowledge of industry best practices for {keyword}, including architecture considerations, common pitfalls to avoid, and implementation strategies. They should show an understanding of how {keyword} fits into the broader technology ecosystem.",
    },
    Template {
        question: "Can you explain a complex concept related to {keyword} in simple terms?",
        answer: "This tests the candidate's depth of understanding and communication skills. A strong answer would break down a complex aspect of {keyword} into clear, accessible explanations without losing technical accuracy.",
    },
];

/// Labels of every dictionary entry found in `jd_text`, in dictionary order, or the
/// default keywords when none is found.
pub fn candidate_keywords(jd_text: &str) -> Vec<&'static str> {
    let lower = jd_text.to_lowercase();
    let matched: Vec<&'static str> = TECH_KEYWORDS
        .iter()
        .filter(|(needle, _)| lower.contains(needle))
        .map(|(_, label)| *label)
        .collect();

    if matched.is_empty() {
        DEFAULT_KEYWORDS.to_vec()
    } else {
        matched
    }
}

/// Exactly `count` questions. Question `i` uses keyword `i mod k` and template `i mod 5`,
/// so identical inputs always produce identical output.
pub fn generate_template_questions(jd_text: &str, count: usize) -> Vec<QuestionDraft> {
    let keywords = candidate_keywords(jd_text);

    (0..count)
        .map(|i| {
            let keyword = keywords[i % keywords.len()];
            let template = &TEMPLATES[i % TEMPLATES.len()];
            QuestionDraft::new(
                template.question.replace(PLACEHOLDER, keyword),
                template.answer.replace(PLACEHOLDER, keyword),
            )
        })
        .collect()
}
