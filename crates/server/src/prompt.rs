//! Prompt text for the two generation rounds.

use retrieval::Candidate;

pub const SYSTEM_PROMPT: &str = "Ești un asistent bibliotecar prietenos. Primești o întrebare a utilizatorului \
și o listă de cărți candidate (titlu + rezumat scurt) provenite dintr-un vector store. \
Scop: alege o singură carte ca recomandare principală, argumentează în 2–4 fraze, \
referindu-te la temele din întrebare (clar și concis). Alege cea mai potrivită carte și, \
dacă este disponibil, apelează un tool pentru a afișa rezumatul complet. \
Răspunde în limba română.";

/// Answer returned when retrieval finds nothing
pub const NO_RESULTS_ANSWER: &str =
    "Nu am găsit cărți relevante în colecție. Poți reformula sau adăuga alte teme?";

/// Answer used when round 1 returns neither text nor tool calls
pub const EMPTY_ANSWER_PLACEHOLDER: &str = "Recomandare generată.";

/// One line per candidate: `index. title — summary`, 1-based, in retrieval order.
pub fn format_candidates(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {} — {}", i + 1, c.title, c.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Round-1 user turn: the query plus the candidate list
pub fn user_turn(query: &str, candidates: &[Candidate]) -> String {
    format!(
        "Întrebarea utilizatorului: {query}\n\n\
         Cărți candidate (titlu + rezumat scurt):\n{}\n\n\
         Alege un singur titlu ca recomandare principală. \
         Dacă e potrivit, apelează tool-ul get_summary_by_title cu titlul exact.",
        format_candidates(candidates)
    )
}
