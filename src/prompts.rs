//! Built-in prompts.
//!
//! Each prompt renders a fixed workflow template, optionally specialised by
//! one argument, and returns it as `{description, text}`.

use crate::envelope::Envelope;
use crate::error::Result;
use crate::registry::{Namespace, Operation, ParamSpec, ParamType, Registry};

/// Register every built-in prompt.
pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(
        Namespace::Prompt,
        Operation::new(
            "daily_review",
            "Review your notes for themes, habits and follow-ups",
            |_, args| {
                let focus = args.str("focus")?;
                Ok(rendered(
                    format!("Daily notes review focusing on {}", focus),
                    analyze_notes(focus),
                ))
            },
        )
        .param(ParamSpec::with_default(
            "focus",
            ParamType::String,
            "Aspect of the notes to concentrate on",
            "recent",
        )),
    )?;

    registry.register(
        Namespace::Prompt,
        Operation::new(
            "project_cleanup",
            "Find misplaced, stale and duplicate files and plan a tidier layout",
            |_, _| {
                Ok(rendered(
                    "Project file organization and cleanup",
                    FILE_ORGANIZATION.to_string(),
                ))
            },
        ),
    )?;

    registry.register(
        Namespace::Prompt,
        Operation::new(
            "code_review",
            "Structured code review checklist for a language",
            |_, args| {
                let language = args.str("language")?;
                Ok(rendered(
                    format!("{} code review", language),
                    code_review(language),
                ))
            },
        )
        .param(ParamSpec::with_default(
            "language",
            ParamType::String,
            "Language under review",
            "python",
        )),
    )?;

    registry.register(
        Namespace::Prompt,
        Operation::new(
            "knowledge_gaps",
            "Look for missing documentation and undocumented areas of the project",
            |_, _| {
                Ok(rendered(
                    "Project analysis focusing on knowledge",
                    analyze_project("knowledge"),
                ))
            },
        ),
    )?;

    registry.register(
        Namespace::Prompt,
        Operation::new(
            "optimize_database",
            "Schema, query and data-quality review of a table",
            |_, args| {
                let table = args.str("table_name")?;
                Ok(rendered(
                    format!("Optimize the {} database", table),
                    optimize_database(table),
                ))
            },
        )
        .param(ParamSpec::with_default(
            "table_name",
            ParamType::String,
            "Table to optimize",
            "notes",
        )),
    )?;

    registry.register(
        Namespace::Prompt,
        Operation::new(
            "database_migration",
            "Plan a schema migration with backups and maintenance",
            |_, _| {
                Ok(rendered(
                    "Database migration and maintenance plan",
                    DATABASE_MIGRATION.to_string(),
                ))
            },
        ),
    )?;

    registry.register(
        Namespace::Prompt,
        Operation::new(
            "refactor_project",
            "Prioritized refactoring and cleanup plan",
            |_, _| {
                Ok(rendered(
                    "Project refactoring plan",
                    REFACTOR_PROJECT.to_string(),
                ))
            },
        ),
    )
}

fn rendered(description: impl Into<String>, text: String) -> Envelope {
    Envelope::success()
        .with("description", description.into())
        .with("text", text)
}

fn analyze_notes(focus: &str) -> String {
    format!(
        "Analyze my notes database focusing on {focus}:

1. **Content Analysis**:
   - Identify common themes and topics
   - Find patterns in note-taking habits
   - Suggest organization improvements

2. **Usage Patterns**:
   - Most active time periods
   - Note length and complexity trends
   - Search query insights

3. **Actionable Insights**:
   - Notes that might need updating
   - Related notes that could be linked
   - Potential knowledge gaps

Please use the available database tools to gather information and provide detailed analysis.
"
    )
}

fn optimize_database(table: &str) -> String {
    format!(
        "Optimize the {table} database:

1. **Schema Analysis**:
   - Review table structure and relationships
   - Identify missing indexes
   - Check for normalization opportunities

2. **Query Performance**:
   - Analyze slow queries
   - Suggest optimization strategies
   - Review query patterns

3. **Data Quality**:
   - Check for duplicate entries
   - Validate data consistency
   - Identify orphaned records

Use the database tools to examine the current state and provide specific recommendations.
"
    )
}

const DATABASE_MIGRATION: &str = "Plan database migration and maintenance:

1. **Migration Planning**:
   - Assess current schema version
   - Plan upgrade path
   - Identify breaking changes

2. **Data Backup**:
   - Create backup strategy
   - Verify backup integrity
   - Plan rollback procedures

3. **Maintenance Tasks**:
   - Vacuum and analyze tables
   - Update statistics
   - Clean up old data

Provide step-by-step migration plan with safety checks.
";

fn analyze_project(focus: &str) -> String {
    format!(
        "Analyze the current project focusing on {focus}:

1. **Project Structure**:
   - Review directory organization
   - Identify key files and their purposes
   - Check for standard project files (README, manifests, etc.)

2. **Code Quality**:
   - Look for consistent naming patterns
   - Check file sizes and complexity
   - Identify potential refactoring opportunities

3. **Documentation**:
   - Assess documentation completeness
   - Find missing or outdated docs
   - Suggest documentation improvements

Use the available file tools to gather information and provide actionable insights.
"
    )
}

fn code_review(language: &str) -> String {
    format!(
        "Perform comprehensive {language} code review:

1. **Code Quality**:
   - Check {language}-specific best practices
   - Identify potential bugs and issues
   - Review error handling

2. **Performance**:
   - Look for performance bottlenecks
   - Suggest optimization opportunities
   - Check resource usage patterns

3. **Maintainability**:
   - Assess code readability
   - Check for code duplication
   - Review naming conventions

4. **Security**:
   - Identify security vulnerabilities
   - Check input validation
   - Review access controls

Provide specific, actionable feedback with examples.
"
    )
}

const REFACTOR_PROJECT: &str = "Plan project refactoring and cleanup:

1. **Structure Improvement**:
   - Reorganize files and directories
   - Improve module separation
   - Clean up import dependencies

2. **Code Cleanup**:
   - Remove unused code and files
   - Consolidate duplicate functionality
   - Improve naming consistency

3. **Documentation Update**:
   - Update outdated documentation
   - Add missing doc comments
   - Improve README and setup instructions

4. **Dependency Management**:
   - Review and update dependencies
   - Remove unused packages
   - Check for security vulnerabilities

Provide a prioritized refactoring plan with clear steps.
";

const FILE_ORGANIZATION: &str = "Organize and manage project files:

1. **File Structure Analysis**:
   - Review current organization
   - Identify misplaced files
   - Check naming conventions

2. **Cleanup Opportunities**:
   - Find temporary and backup files
   - Identify large or unused files
   - Check for duplicate content

3. **Organization Strategy**:
   - Suggest better directory structure
   - Recommend file naming patterns
   - Plan archive and cleanup process

Use file tools to analyze current state and provide specific organization recommendations.
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_substitute_argument() {
        assert!(analyze_notes("habits").starts_with("Analyze my notes database focusing on habits:"));
        assert!(code_review("rust").contains("Check rust-specific best practices"));
        assert!(optimize_database("tags").starts_with("Optimize the tags database:"));
        assert!(analyze_project("knowledge").contains("focusing on knowledge"));
    }

    #[test]
    fn test_all_prompts_registered() {
        let mut registry = Registry::new();
        register(&mut registry).unwrap();
        let names: Vec<&str> = registry.prompts().iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec![
                "daily_review",
                "project_cleanup",
                "code_review",
                "knowledge_gaps",
                "optimize_database",
                "database_migration",
                "refactor_project",
            ]
        );
    }

    #[test]
    fn test_rendered_shape() {
        let env = rendered("d", "t".to_string());
        assert_eq!(
            env.to_json(),
            serde_json::json!({"success": true, "description": "d", "text": "t"})
        );
    }
}
