//! Prompt construction for the chat-completion oracle

/// Prompt asking the model to pull position, location and industry out of a
/// free-text mission statement as a strict JSON object.
#[must_use]
pub fn mission_attributes_prompt(mission: &str) -> String {
    format!(
        r#"Identify the position, location, and industry in the mission. Return ONLY a valid JSON object with this exact structure:

{{
    "position": "Position mentioned in the mission or N/A",
    "location": "Location mentioned in the mission or N/A",
    "industry": "Industry mentioned in the mission or N/A"
}}

Mission: {mission}"#
    )
}

/// Prompt asking the model to rank candidate connections against a mission
/// and answer with a strict JSON array of suggestions.
#[must_use]
pub fn suggestion_prompt(mission: &str, connection_lines: &[String]) -> String {
    format!(
        r#"Mission: {mission}

Connections:
{connections}

Based on the mission above and the detailed profile information provided, suggest the top 4 most relevant connections who could help. Use the enriched profile data (summary, location, industry, company info) to make intelligent matches.

For each suggestion, provide:
1. Name and current role/headline
2. Why they're relevant (specific reasoning based on their enriched profile data)
3. How they could specifically help with this mission
4. What makes them a strong connection for this goal

Return ONLY a valid JSON array with this exact structure:
[
{{
    "name": "Full Name",
    "role": "Current Role/Headline",
    "company": "Current Company",
    "reasoning": "Why they're relevant based on their profile",
    "how_they_help": "Specific ways they can help with the mission"
}}
]"#,
        connections = connection_lines.join("\n")
    )
}

/// Prompt for a short personalized reconnection message to one contact.
#[must_use]
pub fn outreach_message_prompt(
    name: &str,
    company: &str,
    role: &str,
    mission: &str,
    profile_summary: &str,
    location: &str,
) -> String {
    format!(
        r#"Write a short, warm, personalized message to reconnect with {name}, who works as {role} at {company}.

Context about them:
- Profile summary: {profile_summary}
- Location: {location}

My current goal: {mission}

The message should:
1. Feel personal and reference their background naturally
2. Briefly mention my goal and why I thought of them
3. Propose a low-commitment next step (a quick call or coffee)
4. Stay under 120 words and avoid sounding like a template

Return ONLY the message text, no preamble or explanation."#
    )
}
