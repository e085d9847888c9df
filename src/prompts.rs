//! Prompt templates for answering, summarizing, and name extraction.

/// Recruiter question over retrieved CV excerpts.
pub fn answer_prompt(context: &str, question: &str) -> String {
    format!(
        r#"You are a skilled recruitment assistant. The context below contains partial excerpts from candidate CVs.

Answer the question using **only** the information in the context. Be specific and factual.

Include relevant supporting details from the context so the answer is clear and informative, but do **not** mention the context or say that the answer is based on it.

Avoid filler phrases and state the facts plainly. If the information is missing, say so clearly.

Context:
{context}

Question:
{question}

Answer:
"#
    )
}

/// Structured summary of one full CV.
pub fn summary_prompt(cv: &str) -> String {
    format!(
        r#"You are an expert recruitment assistant. Read the full CV of a candidate and write a professional, well-structured summary.

Start with a narrative paragraph covering the candidate's background, education, experience, and professional focus. Do not copy text from the CV; rephrase it in a natural tone.

Then give the following sections, with no text before or after them:

---

**Skills**
The candidate's technical and soft skills as bullet points, grouped where natural (Programming Languages, Frameworks, Tools, ...).

**Extracted Insights**
- **Strengths**: what stands out and what the candidate is good at.
- **Areas for Improvement**: gaps, weak spots, or missing experience worth developing.

---

CV:
{cv}

Summary:
"#
    )
}

/// Ask for the candidate's full name and nothing else.
pub fn name_prompt(cv: &str) -> String {
    format!(
        r#"You will be given the text of a candidate's CV.

Extract **only** the candidate's full name as it appears in the CV. Do **not** include labels, explanations, punctuation, or any other text. Return only the name.

CV:
{cv}

Name:
"#
    )
}
