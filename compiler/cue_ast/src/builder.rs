// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A fluent construction API for CUE ASTs, used by tests in place of a real lexer/parser.
//!
//! Every method takes the byte span the node would have occupied in source text; callers
//! are expected to keep a comment with the literal source alongside their builder calls so
//! the offsets stay honest. [`crate::validate::Validator`] then confirms every node got a
//! unique ID.

use crate::{
    assigner::Assigner,
    ast::{
        Alias, AliasScope, Attribute, BasicLit, BasicLitKind, BinOp, BinaryExpr, CallExpr, Clause,
        CommentGroup, Comprehension, Decl, EmbedDecl, Ellipsis, Expr, Field, File, ForClause,
        Ident, IfClause, ImportDecl, ImportSpec, IndexExpr, Interpolation, Label, LabelKind,
        LetClause, ListLit, Package, ParenExpr, PostfixExpr, PostfixOp, Selector, SelectorExpr,
        StringComponent, StructLit, UnOp, UnaryExpr,
    },
};
use cue_data_structures::span::Span;
use std::rc::Rc;

pub struct Builder {
    assigner: Assigner,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            assigner: Assigner::new(),
        }
    }

    fn id(&mut self) -> crate::ast::NodeId {
        self.assigner.next_id()
    }

    pub fn ident(&mut self, name: &str, span: Span) -> Rc<Ident> {
        Rc::new(Ident {
            id: self.id(),
            span,
            name: Rc::from(name),
        })
    }

    pub fn lit(&mut self, kind: BasicLitKind, value: &str, span: Span) -> Rc<BasicLit> {
        Rc::new(BasicLit {
            id: self.id(),
            span,
            kind,
            value: Rc::from(value),
        })
    }

    pub fn int(&mut self, value: &str, span: Span) -> Rc<BasicLit> {
        self.lit(BasicLitKind::Int, value, span)
    }

    pub fn string(&mut self, value: &str, span: Span) -> Rc<BasicLit> {
        self.lit(BasicLitKind::String, value, span)
    }

    pub fn label_ident(&mut self, ident: Rc<Ident>) -> Rc<Label> {
        let span = ident.span;
        Rc::new(Label {
            id: self.id(),
            span,
            kind: LabelKind::Ident(ident),
            alias: None,
            alias_scope: AliasScope::None,
        })
    }

    pub fn label_aliased_ident(
        &mut self,
        alias: Rc<Ident>,
        ident: Rc<Ident>,
        span: Span,
    ) -> Rc<Label> {
        Rc::new(Label {
            id: self.id(),
            span,
            kind: LabelKind::Ident(ident),
            alias: Some(alias),
            alias_scope: AliasScope::Parent,
        })
    }

    pub fn label_string(&mut self, lit: Rc<BasicLit>) -> Rc<Label> {
        let span = lit.span;
        Rc::new(Label {
            id: self.id(),
            span,
            kind: LabelKind::String(lit),
            alias: None,
            alias_scope: AliasScope::None,
        })
    }

    pub fn label_numeric(&mut self, lit: Rc<BasicLit>) -> Rc<Label> {
        let span = lit.span;
        Rc::new(Label {
            id: self.id(),
            span,
            kind: LabelKind::Numeric(lit),
            alias: None,
            alias_scope: AliasScope::None,
        })
    }

    pub fn label_pattern(&mut self, alias: Option<Rc<Ident>>, pattern: Expr, span: Span) -> Rc<Label> {
        let alias_scope = if alias.is_some() {
            AliasScope::Value
        } else {
            AliasScope::None
        };
        Rc::new(Label {
            id: self.id(),
            span,
            kind: LabelKind::Paren(pattern),
            alias,
            alias_scope,
        })
    }

    pub fn field(&mut self, label: Rc<Label>, value: Expr, span: Span) -> Decl {
        Decl::Field(Rc::new(Field {
            id: self.id(),
            span,
            label,
            optional: false,
            value,
            attributes: Box::new([]),
            docs: None,
        }))
    }

    pub fn field_with(
        &mut self,
        label: Rc<Label>,
        value: Expr,
        optional: bool,
        attributes: Vec<Rc<Attribute>>,
        docs: Option<Rc<CommentGroup>>,
        span: Span,
    ) -> Decl {
        Decl::Field(Rc::new(Field {
            id: self.id(),
            span,
            label,
            optional,
            value,
            attributes: attributes.into_boxed_slice(),
            docs,
        }))
    }

    pub fn embed(&mut self, expr: Expr, span: Span) -> Decl {
        Decl::Embed(Rc::new(EmbedDecl {
            id: self.id(),
            span,
            expr,
        }))
    }

    pub fn alias_decl(&mut self, ident: Rc<Ident>, expr: Expr, span: Span) -> Decl {
        Decl::Alias(Rc::new(Alias {
            id: self.id(),
            span,
            ident,
            expr,
        }))
    }

    pub fn alias_expr(&mut self, ident: Rc<Ident>, expr: Expr, span: Span) -> Expr {
        Expr::Alias(Rc::new(Alias {
            id: self.id(),
            span,
            ident,
            expr,
        }))
    }

    pub fn ellipsis(&mut self, ty: Option<Expr>, span: Span) -> Rc<Ellipsis> {
        Rc::new(Ellipsis {
            id: self.id(),
            span,
            ty,
        })
    }

    pub fn ellipsis_decl(&mut self, ty: Option<Expr>, span: Span) -> Decl {
        Decl::Ellipsis(self.ellipsis(ty, span))
    }

    pub fn attribute(&mut self, name: &str, text: &str, span: Span) -> Rc<Attribute> {
        Rc::new(Attribute {
            id: self.id(),
            span,
            name: self.ident(name, span),
            text: Rc::from(text),
        })
    }

    pub fn doc_comment(&mut self, lines: Vec<&str>, span: Span) -> Rc<CommentGroup> {
        Rc::new(CommentGroup {
            id: self.id(),
            span,
            lines: lines.into_iter().map(Rc::from).collect(),
        })
    }

    pub fn struct_lit(&mut self, elements: Vec<Decl>, span: Span) -> StructLit {
        StructLit {
            id: self.id(),
            span,
            elements: elements.into_boxed_slice(),
        }
    }

    pub fn struct_expr(&mut self, elements: Vec<Decl>, span: Span) -> Expr {
        Expr::Struct(Rc::new(self.struct_lit(elements, span)))
    }

    pub fn list_expr(&mut self, elements: Vec<Expr>, span: Span) -> Expr {
        Expr::List(Rc::new(ListLit {
            id: self.id(),
            span,
            elements: elements.into_boxed_slice(),
        }))
    }

    pub fn ident_expr(&mut self, ident: Rc<Ident>) -> Expr {
        Expr::Ident(ident)
    }

    pub fn lit_expr(&mut self, lit: Rc<BasicLit>) -> Expr {
        Expr::Lit(lit)
    }

    pub fn interpolation(&mut self, components: Vec<StringComponent>, span: Span) -> Expr {
        Expr::Interpolation(Rc::new(Interpolation {
            id: self.id(),
            span,
            components: components.into_boxed_slice(),
        }))
    }

    pub fn paren(&mut self, expr: Expr, span: Span) -> Expr {
        Expr::Paren(Rc::new(ParenExpr {
            id: self.id(),
            span,
            expr,
        }))
    }

    pub fn unary(&mut self, op: UnOp, expr: Expr, span: Span) -> Expr {
        Expr::Unary(Rc::new(UnaryExpr {
            id: self.id(),
            span,
            op,
            expr,
        }))
    }

    pub fn binary(&mut self, op: BinOp, lhs: Expr, rhs: Expr, span: Span) -> Expr {
        Expr::Binary(Rc::new(BinaryExpr {
            id: self.id(),
            span,
            op,
            lhs,
            rhs,
        }))
    }

    pub fn and(&mut self, lhs: Expr, rhs: Expr, span: Span) -> Expr {
        self.binary(BinOp::And, lhs, rhs, span)
    }

    pub fn or(&mut self, lhs: Expr, rhs: Expr, span: Span) -> Expr {
        self.binary(BinOp::Or, lhs, rhs, span)
    }

    pub fn call(&mut self, callee: Expr, args: Vec<Expr>, span: Span) -> Expr {
        Expr::Call(Rc::new(CallExpr {
            id: self.id(),
            span,
            callee,
            args: args.into_boxed_slice(),
        }))
    }

    pub fn selector(&mut self, expr: Expr, sel: Rc<Ident>, span: Span) -> Expr {
        Expr::Selector(Rc::new(SelectorExpr {
            id: self.id(),
            span,
            expr,
            sel: Selector::Ident(sel),
        }))
    }

    pub fn selector_str(&mut self, expr: Expr, sel: Rc<BasicLit>, span: Span) -> Expr {
        Expr::Selector(Rc::new(SelectorExpr {
            id: self.id(),
            span,
            expr,
            sel: Selector::String(sel),
        }))
    }

    pub fn index(&mut self, expr: Expr, index: Expr, span: Span) -> Expr {
        Expr::Index(Rc::new(IndexExpr {
            id: self.id(),
            span,
            expr,
            index,
        }))
    }

    pub fn postfix(&mut self, expr: Expr, op: PostfixOp, span: Span) -> Expr {
        Expr::Postfix(Rc::new(PostfixExpr {
            id: self.id(),
            span,
            expr,
            op,
        }))
    }

    pub fn for_clause(
        &mut self,
        key: Option<Rc<Ident>>,
        value: Rc<Ident>,
        source: Expr,
        span: Span,
    ) -> Clause {
        Clause::For(Rc::new(ForClause {
            id: self.id(),
            span,
            key,
            value,
            source,
        }))
    }

    pub fn if_clause(&mut self, cond: Expr, span: Span) -> Clause {
        Clause::If(Rc::new(IfClause {
            id: self.id(),
            span,
            cond,
        }))
    }

    pub fn let_clause(&mut self, ident: Rc<Ident>, expr: Expr, span: Span) -> Clause {
        Clause::Let(Rc::new(LetClause {
            id: self.id(),
            span,
            ident,
            expr,
        }))
    }

    pub fn comprehension(&mut self, clauses: Vec<Clause>, value: StructLit, span: Span) -> Expr {
        Expr::Comprehension(Rc::new(Comprehension {
            id: self.id(),
            span,
            clauses: clauses.into_boxed_slice(),
            value: Rc::new(value),
        }))
    }

    pub fn import_spec(&mut self, alias: Option<Rc<Ident>>, path: &str, span: Span) -> Rc<ImportSpec> {
        Rc::new(ImportSpec {
            id: self.id(),
            span,
            alias,
            path: self.string(path, span),
        })
    }

    pub fn import_decl(&mut self, specs: Vec<Rc<ImportSpec>>, span: Span) -> Decl {
        Decl::Import(Rc::new(ImportDecl {
            id: self.id(),
            span,
            specs: specs.into_boxed_slice(),
        }))
    }

    pub fn package(&mut self, name: Option<Rc<Ident>>, span: Span) -> Rc<Package> {
        Rc::new(Package {
            id: self.id(),
            span,
            name,
        })
    }

    /// Builds a file. `span` should cover the whole source text plus one extra byte past
    /// EOF, matching what a real parser does.
    pub fn file(
        &mut self,
        name: &str,
        package: Option<Rc<Package>>,
        decls: Vec<Decl>,
        span: Span,
    ) -> File {
        File {
            id: self.id(),
            span,
            name: Rc::from(name),
            package,
            decls: decls.into_boxed_slice(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Builder;
    use crate::ast::Node;
    use cue_data_structures::span::Span;

    #[test]
    fn builds_a_minimal_field_with_accurate_spans() {
        let mut b = Builder::new();
        // a: 5
        let a = b.ident("a", Span::new(0, 1));
        let five = b.int("5", Span::new(3, 4));
        let value = b.lit_expr(five);
        let label = b.label_ident(a);
        let field = b.field(label, value, Span::new(0, 4));
        let file = b.file("t.cue", None, vec![field], Span::new(0, 5));
        assert_eq!(file.size(), 4);
        assert_eq!(file.decls.len(), 1);
        assert_eq!(file.decls[0].span(), Span::new(0, 4));
    }
}
