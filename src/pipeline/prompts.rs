//! Prompt construction.

/// Translation prompt. The model is asked for the bare translation only.
pub fn build_translation_prompt(content: &str, from_language: &str, to_language: &str) -> String {
    format!(
        "You are a professional financial translator. Translate the following {from_language} \
         financial email content to {to_language}.\n\n\
         Maintain all financial terms, company names, dates, and numerical values exactly as they \
         appear. Focus on clear, professional translation that preserves the original meaning and \
         context.\n\n\
         Email content to translate:\n\
         {content}\n\n\
         Provide only the translation, no additional commentary."
    )
}

/// Analysis prompt asking for the structured JSON shape.
pub fn build_analysis_prompt(content: &str, language: &str) -> String {
    format!(
        "You are a financial analyst. Analyze the following financial email and provide a concise \
         summary with key insights.\n\n\
         Email content:\n\
         {content}\n\n\
         Please provide:\n\
         1. A brief summary (2-3 sentences)\n\
         2. Key financial information or market insights\n\
         3. Any important dates, numbers, or action items\n\
         4. Overall sentiment (positive/negative/neutral)\n\n\
         Write your answer in {language}.\n\
         Format your response as JSON with these fields: summary, keyInsights, importantDetails, \
         sentiment"
    )
}
