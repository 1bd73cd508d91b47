// Prompt constants shared by the hosted providers.
// Templates use `{placeholder}` markers filled with `str::replace` before sending.

/// Appended to every system prompt that expects structured output.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

pub const ANALYZE_SYSTEM: &str = "You are an AI assistant that analyzes job descriptions.";

/// Replace `{jd_text}` before sending.
pub const ANALYZE_PROMPT_TEMPLATE: &str = r#"Analyze the following text and determine if it constitutes a professional job description.
Consider the presence of job responsibilities, required qualifications, and company information.
Return a confidence percentage (0-100) and, if it is a job description, a concise 3-sentence overview of its key aspects.

Text to analyze:
{jd_text}

Return a JSON object with this EXACT schema:
{
  "is_valid_jd": true,
  "confidence": 85,
  "overview": "3-sentence overview if valid, otherwise empty"
}"#;

pub const QUESTIONS_SYSTEM: &str =
    "You are an AI assistant that generates relevant interview questions from job descriptions.";

/// Replace `{question_count}` and `{jd_text}` before sending.
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Based on the following job description, generate exactly {question_count} interview questions
that assess a candidate's fit for this role. For each question provide a reference answer
describing what an excellent answer covers.

The questions must:
1. Be directly related to the skills, technologies and requirements named in the job description
2. Cover both the technical and the interpersonal skills the role requires
3. Be specific to this job, not generic interview questions

Job Description:
{jd_text}

Return a JSON object with this EXACT schema:
{
  "questions": [
    {"text": "question 1", "reference_answer": "reference answer 1"}
  ]
}

Generate exactly {question_count} questions, no more and no less."#;

pub const EVALUATE_SYSTEM: &str = "You are an AI assistant that evaluates interview answers.";

/// Replace `{question}`, `{reference_answer}` and `{user_answer}` before sending.
pub const EVALUATE_PROMPT_TEMPLATE: &str = r#"Evaluate the candidate's answer to the interview question below.
Compare it semantically with the reference answer and score it from 0 to 100 based on
relevance, completeness relative to the reference, clarity, and concrete detail.

Question: {question}
Reference Answer: {reference_answer}
Candidate Answer: {user_answer}

Return a JSON object with this EXACT schema:
{
  "score": 75,
  "feedback": "strengths and weaknesses of the answer",
  "improvement_suggestions": "specific suggestions for improvement"
}"#;

pub const ANSWER_SYSTEM: &str = "You are an AI assistant that helps job candidates prepare for \
    interviews by writing high-quality answers to interview questions.";

/// Replace `{question}` before sending.
pub const ANSWER_PROMPT_TEMPLATE: &str = r#"Provide a comprehensive, well-structured answer to this interview question:

Question: {question}

The answer should be detailed, include specific examples, demonstrate technical depth,
and be around 200-300 words. Respond with the answer text only."#;

pub const BRIEF_ANSWER_SYSTEM: &str = "You are an AI assistant helping with interview preparation.";

/// Second-attempt prompt when the full answer is unusable. Replace `{question}`.
pub const BRIEF_ANSWER_PROMPT_TEMPLATE: &str = r#"Please provide a brief, general answer to this interview question:

Question: {question}

Keep your answer concise and professional."#;

/// Fills `{name}` placeholders in a single pass over the template. Substituted values
/// are never scanned again, and unknown or unmatched braces are kept as written.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match hit {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn analyze_prompt(jd_text: &str) -> String {
    fill(ANALYZE_PROMPT_TEMPLATE, &[("jd_text", jd_text)])
}

pub fn questions_prompt(jd_text: &str, count: usize) -> String {
    fill(
        QUESTIONS_PROMPT_TEMPLATE,
        &[("question_count", &count.to_string()), ("jd_text", jd_text)],
    )
}

pub fn evaluate_prompt(question: &str, user_answer: &str, reference_answer: &str) -> String {
    fill(
        EVALUATE_PROMPT_TEMPLATE,
        &[
            ("question", question),
            ("reference_answer", reference_answer),
            ("user_answer", user_answer),
        ],
    )
}

pub fn answer_prompt(question: &str) -> String {
    fill(ANSWER_PROMPT_TEMPLATE, &[("question", question)])
}

pub fn brief_answer_prompt(question: &str) -> String {
    fill(BRIEF_ANSWER_PROMPT_TEMPLATE, &[("question", question)])
}

/// System prompt with the JSON-only instruction appended.
pub fn json_system(system: &str) -> String {
    format!("{system} {JSON_ONLY_INSTRUCTION}")
}
