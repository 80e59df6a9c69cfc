use crate::domain::company::CompanySnapshot;

pub const STRATEGIST_SYSTEM_PROMPT: &str = "\
You are an advanced AI Executive Strategist, combining the role of a CEO with the marketing genius of Philip Kotler (Marketing 5.0).

Your Core Frameworks:
1. **Marketing 5.0**: You focus on Data-driven, Predictive, Contextual, Augmented, and Agile marketing.
2. **Brand Humanity**: You evaluate the company based on Physicality, Intellect, Sociability, Emotionality, Personability, and Morality.
3. **The Next Best Action**: You always suggest the immediate next step to maximize value.

When the user asks you questions:
1. Analyze the financial AND marketing metrics provided.
2. Give advice that balances profitability with \"Technology for Humanity\".
3. Use terms like \"Predictive Segmenting\", \"Contextual Engagement\", \"Omnichannel Experience\", and \"Brand Equity\".
4. Be decisive. You are the leader.
";

pub const SIMULATION_SYSTEM_PROMPT: &str =
    "You are a pragmatic, data-driven Executive running a risk assessment simulation.";

pub const MARKETING_ANALYSIS_PROMPT: &str = "\
Act as a Chief Marketing Officer AI inspired by Marketing 5.0.
Analyze the provided customer segments and Brand Humanity Index.
Generate exactly 3 specific \"Next Best Actions\" (NBA) for the company.
For each action, specify:
1. The Target Segment.
2. The Channel (e.g., Metaverse, Social, Email, IoT).
3. The Rationale (linking to Predictive or Contextual theory).

Format the output as a JSON array of objects with keys: title, target, action, impact.
Do not include markdown formatting. Just the raw JSON.
";

/// Status report prepended to every strategist question.
pub fn advice_context(company: &CompanySnapshot) -> String {
    let segments = company
        .marketing_segments
        .iter()
        .map(|s| format!("{} (CLV: ${}, Sentiment: {})", s.name, s.clv, s.sentiment))
        .collect::<Vec<_>>()
        .join(", ");
    let brand = &company.brand_index;
    let (revenue, users) = match company.latest_metric() {
        Some(m) => (format!("${}", group_thousands(m.revenue)), group_thousands(m.users as f64)),
        None => ("n/a".to_string(), "n/a".to_string()),
    };

    format!(
        "CURRENT COMPANY STATUS REPORT:\n\
Company Name: {name}\n\
Industry: {industry}\n\
Cash on Hand: ${cash}\n\
\n\
MARKETING INTELLIGENCE:\n\
Segments: {segments}\n\
Brand Humanity Index: Intellect {intellect}/100, Emotionality {emotionality}/100, Morality {morality}/100.\n\
\n\
Recent Performance (Last Month):\n\
Revenue: {revenue}\n\
Users: {users}",
        name = company.name,
        industry = company.industry,
        cash = group_thousands(company.cash_on_hand),
        intellect = brand.intellect,
        emotionality = brand.emotionality,
        morality = brand.morality,
    )
}

pub fn advice_query(context: &str, user_text: &str) -> String {
    format!("[SYSTEM DATA CONTEXT]\n{context}\n\n[USER QUERY]\n{user_text}")
}

pub fn simulation_prompt(company: &CompanySnapshot, scenario: &str) -> String {
    format!(
        "As the CEO/CMO, run a simulation for the following strategic decision: \"{scenario}\".\n\
\n\
Based on our current metrics (Cash: ${cash}, Segments: {segments}), provide:\n\
1. Projected Outcome (Best Case & Worst Case)\n\
2. Potential Risks\n\
3. Alignment with Marketing 5.0 (Data-driven, Agile, Human-centric)\n\
4. Your Final Decision\n\
\n\
Format the output as a structured executive memo.",
        cash = company.cash_on_hand,
        segments = company.marketing_segments.len(),
    )
}

pub fn actions_context(company: &CompanySnapshot) -> anyhow::Result<String> {
    let segments = serde_json::to_string(&company.marketing_segments)?;
    let brand = serde_json::to_string(&company.brand_index)?;
    Ok(format!(
        "Context: Segments: {segments}\nBrand Humanity Index: {brand}\nIndustry: {}",
        company.industry
    ))
}

/// `1200000.5` -> `1,200,000.5`. At most three fraction digits are kept.
pub fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        "-"
    } else {
        ""
    };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}
