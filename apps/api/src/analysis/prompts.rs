// All LLM prompt templates for the analysis pipeline.
// Placeholders are `{name}` and are filled by `render`.

/// Header label for resume text in the keyword prompt.
pub const RESUME_CONTEXT: &str = "RESUME";
/// Header label for job-description text in the keyword prompt.
pub const JOB_CONTEXT: &str = "JOB DESCRIPTION";

/// Keyword extraction prompt. Replace: {document}, {context}, {text}.
pub const KEYWORD_EXTRACTION_PROMPT: &str = r#"Extract the most important keywords and skills from the following {document}.
Focus on technical skills, tools, frameworks, soft skills, and domain-specific terms.

{context}:
{text}

Return a comma-separated list of keywords (maximum 30 keywords):"#;

/// Match analysis prompt. Replace: {job_keywords}, {resume_keywords},
/// {job_description}, {resume_text}, {bullet_points}, {max_suggestions}.
pub const MATCH_ANALYSIS_PROMPT: &str = r#"Analyze how well this resume matches the job description.

Job Description Keywords: {job_keywords}
Resume Keywords: {resume_keywords}

Full Job Description:
{job_description}

Full Resume:
{resume_text}

Resume bullet points that could be improved:
{bullet_points}

Return a JSON object with this EXACT schema:
{
  "match_percentage": 72,
  "matched_keywords": ["Python", "Django"],
  "missing_keywords": ["AWS"],
  "suggestions": [
    {
      "original": "Built REST APIs",
      "improved": "Built 12 Django REST APIs on AWS serving 50k daily requests",
      "reason": "Adds the missing AWS keyword and quantifies impact"
    }
  ],
  "strengths": ["Five years of production Python"],
  "areas_for_improvement": ["No cloud platform experience listed"]
}

Rules:
- match_percentage is a number from 0 to 100
- a keyword may appear in matched_keywords or missing_keywords, never both
- give at most {max_suggestions} suggestions, each rewriting one of the bullet points above
- strengths and areas_for_improvement are arrays of short sentences"#;

/// Fills `{key}` placeholders in a single left-to-right pass, so values that
/// themselves contain `{...}` are never expanded again.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let hit = vars.iter().find_map(|(key, value)| {
            tail.strip_prefix('{')
                .and_then(|t| t.strip_prefix(key))
                .and_then(|t| t.strip_prefix('}'))
                .map(|after| (value, after))
        });
        match hit {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
