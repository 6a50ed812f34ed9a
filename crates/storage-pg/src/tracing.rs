// Copyright 2024 The Gantry developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use tracing::Span;

/// Extension trait for [`sqlx::Execute`], recording the statement on the
/// current span under the `db.query.text` field
///
/// The field has to be declared by the enclosing span for the value to be
/// kept, usually through `#[tracing::instrument(fields(db.query.text))]`.
pub trait ExecuteExt<'q, DB>: Sized {
    /// Record the SQL of this query on [`Span::current`]
    #[must_use]
    fn traced(self) -> Self;
}

impl<'q, DB, T> ExecuteExt<'q, DB> for T
where
    T: sqlx::Execute<'q, DB>,
    DB: sqlx::Database,
{
    fn traced(self) -> Self {
        Span::current().record("db.query.text", self.sql());
        self
    }
}
